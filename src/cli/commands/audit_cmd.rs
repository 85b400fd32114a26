//! `credvault audit`: show who did what to which entry.
//!
//! Rows are scoped to the selected vault unless `--all-vaults` is given,
//! and can be narrowed to one operation or one entry's history:
//!
//!   credvault audit --since 7d
//!   credvault audit --op delete --since 2024-05-01
//!   credvault audit --entry 3f2a1c9e

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::audit::{self, AuditLog, AuditQuery};
use crate::cli::output;
use crate::cli::{AuditArgs, Cli};
use crate::errors::{CredVaultError, Result};
use crate::vault::VaultPaths;

/// Shortest id prefix accepted by `--entry`.
const MIN_ENTRY_PREFIX: usize = 4;

/// Execute the `audit` command.
pub fn execute(cli: &Cli, args: &AuditArgs) -> Result<()> {
    let paths = VaultPaths::new(&cli.vault);
    let query = build_query(&paths, args, Utc::now())?;

    let log = AuditLog::open(paths.dir())
        .ok_or_else(|| CredVaultError::Audit("failed to open audit database".into()))?;
    let rows = log.query(&query)?;

    if rows.is_empty() {
        output::info("No audit entries match.");
        if query.vault.is_some() {
            output::tip("Pass --all-vaults to include other vaults in this directory.");
        }
        return Ok(());
    }

    output::print_audit_entries(&rows, args.all_vaults);
    Ok(())
}

fn build_query(paths: &VaultPaths, args: &AuditArgs, now: DateTime<Utc>) -> Result<AuditQuery> {
    let since = match args.since.as_deref() {
        Some(s) => Some(parse_since(s, now)?),
        None => None,
    };
    let entry_prefix = match args.entry.as_deref() {
        Some(e) => Some(entry_prefix(e)?),
        None => None,
    };

    Ok(AuditQuery {
        limit: args.last,
        since,
        vault: (!args.all_vaults).then(|| audit::vault_name(paths)),
        operation: args.operation,
        entry_prefix,
    })
}

/// A span back from `now` (`30m`, `24h`, `7d`, `2w`), a calendar date
/// (midnight UTC), or a full RFC 3339 timestamp.
fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    let invalid = || {
        CredVaultError::CommandFailed(format!(
            "invalid --since '{input}': use a span like 30m, 24h, 7d, 2w or a date like 2024-05-01"
        ))
    };
    let (split, _) = input.char_indices().last().ok_or_else(invalid)?;
    let (amount, unit) = input.split_at(split);
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    if amount < 0 {
        return Err(invalid());
    }
    let span = match unit {
        "m" => Duration::minutes(amount),
        "h" => Duration::hours(amount),
        "d" => Duration::days(amount),
        "w" => Duration::weeks(amount),
        _ => return Err(invalid()),
    };
    Ok(now - span)
}

/// Entry ids are logged as lowercase hyphenated uuids.
fn entry_prefix(input: &str) -> Result<String> {
    let prefix = input.trim().to_ascii_lowercase();
    let well_formed = prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
    if !well_formed || prefix.len() < MIN_ENTRY_PREFIX {
        return Err(CredVaultError::CommandFailed(format!(
            "--entry expects an entry id or at least {MIN_ENTRY_PREFIX} of its leading characters"
        )));
    }
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use chrono::TimeZone;
    use clap::Parser;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn audit_args(argv: &[&str]) -> AuditArgs {
        let mut full = vec!["credvault", "--vault", "/tmp/x/work.cvault", "audit"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            crate::cli::Commands::Audit(args) => args,
            _ => panic!("expected the audit subcommand"),
        }
    }

    #[test]
    fn spans_count_back_from_now() {
        let now = fixed_now();
        assert_eq!(parse_since("30m", now).unwrap(), now - Duration::minutes(30));
        assert_eq!(parse_since("24h", now).unwrap(), now - Duration::hours(24));
        assert_eq!(parse_since("7d", now).unwrap(), now - Duration::days(7));
        assert_eq!(parse_since(" 2w ", now).unwrap(), now - Duration::days(14));
    }

    #[test]
    fn dates_and_timestamps_are_absolute() {
        let now = fixed_now();
        assert_eq!(
            parse_since("2024-05-01", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_since("2024-05-01T08:30:00+02:00", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap()
        );
    }

    #[test]
    fn malformed_since_is_rejected() {
        let now = fixed_now();
        for bad in ["", "d", "7x", "abc", "-3d", "2024-13-01"] {
            assert!(parse_since(bad, now).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn entry_prefixes_must_look_like_ids() {
        assert_eq!(entry_prefix("3F2A1C9E").unwrap(), "3f2a1c9e");
        assert!(entry_prefix("3f2").is_err());
        assert!(entry_prefix("GitHub").is_err());
        assert!(entry_prefix("3f2a%").is_err());
    }

    #[test]
    fn query_is_scoped_to_the_selected_vault() {
        let paths = VaultPaths::new("/tmp/x/work.cvault");
        let args = audit_args(&["--op", "delete", "--entry", "3f2a1c9e", "--last", "5"]);

        let query = build_query(&paths, &args, fixed_now()).unwrap();
        assert_eq!(query.vault.as_deref(), Some("work.cvault"));
        assert_eq!(query.operation, Some(Operation::Delete));
        assert_eq!(query.entry_prefix.as_deref(), Some("3f2a1c9e"));
        assert_eq!(query.limit, 5);
        assert!(query.since.is_none());

        let everywhere = build_query(&paths, &audit_args(&["--all-vaults"]), fixed_now()).unwrap();
        assert!(everywhere.vault.is_none());
    }

    #[test]
    fn filters_reach_the_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = VaultPaths::new(dir.path().join("work.cvault"));
        let log = AuditLog::open(paths.dir()).unwrap();
        let id = uuid::Uuid::new_v4();
        log.log(Operation::Add, "work.cvault", Some(id), None);
        log.log(Operation::Delete, "work.cvault", Some(id), None);
        log.log(Operation::Delete, "home.cvault", Some(id), None);

        let prefix = id.to_string()[..8].to_string();
        let args = audit_args(&["--op", "delete", "--entry", prefix.as_str()]);
        let rows = log.query(&build_query(&paths, &args, Utc::now()).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vault, "work.cvault");
    }
}
