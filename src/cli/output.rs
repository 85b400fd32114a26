//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

#[cfg(feature = "audit-log")]
use crate::audit::{AuditEntry, Operation};
use crate::security::{IssueKind, SecurityReport, StrengthLevel, VaultStatistics};
use crate::vault::{EntryKind, EntryType, VaultEntry, VaultStore};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// First 8 hex digits of an id; enough to pass back to `get`/`edit`.
pub fn short_id(entry: &VaultEntry) -> String {
    entry.id.to_string()[..8].to_string()
}

/// The one-line summary shown in the table's "Detail" column.
fn summary(entry: &VaultEntry) -> String {
    match &entry.kind {
        EntryKind::Login(login) => {
            if login.username.is_empty() {
                login.email.clone()
            } else {
                login.username.clone()
            }
        }
        EntryKind::SecureNote(note) => format!("{} chars", note.content.chars().count()),
        EntryKind::Card(card) => format!("{} {}", card.brand.as_str(), card.masked_number()),
        EntryKind::Identity(identity) => identity.full_name(),
    }
}

/// Print a table of entries (Id, Name, Type, Detail, Folder, Updated).
pub fn print_entries_table(store: &VaultStore, entries: &[&VaultEntry]) {
    if entries.is_empty() {
        info("No entries match.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Type", "Detail", "Folder", "Updated"]);

    for entry in entries {
        let name = if entry.favorite {
            format!("\u{2605} {}", entry.name)
        } else {
            entry.name.clone()
        };
        let folder = entry
            .folder_id
            .and_then(|id| store.folder_path(id).ok())
            .unwrap_or_default();
        table.add_row(vec![
            short_id(entry),
            name,
            entry.entry_type().to_string(),
            summary(entry),
            folder,
            entry.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
}

fn secret(value: &str, show: bool) -> String {
    if value.is_empty() {
        String::new()
    } else if show {
        value.to_string()
    } else {
        "\u{2022}".repeat(8)
    }
}

fn field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<14} {}", style(label).dim(), value);
    }
}

/// Print every field of one entry.  Secrets are masked unless `show`.
pub fn print_entry(store: &VaultStore, entry: &VaultEntry, show: bool) {
    println!(
        "{} {} {}",
        style(&entry.name).bold(),
        style(format!("({})", entry.entry_type())).dim(),
        if entry.favorite { "\u{2605}" } else { "" }
    );
    field("Id", &entry.id.to_string());

    match &entry.kind {
        EntryKind::Login(login) => {
            field("Username", &login.username);
            field("Email", &login.email);
            field("Password", &secret(&login.password, show));
            for url in &login.urls {
                field("URL", url);
            }
            if login.has_totp() {
                field("TOTP", "configured");
            }
            field("Pw changed", &format!("{} days ago", entry.password_age_days()));
            if !login.password_history.is_empty() {
                field("History", &format!("{} previous", login.password_history.len()));
            }
        }
        EntryKind::SecureNote(note) => {
            let body = if show {
                note.content.clone()
            } else {
                secret(&note.content, false)
            };
            field("Content", &body);
        }
        EntryKind::Card(card) => {
            field("Holder", &card.cardholder_name);
            field("Brand", card.brand.as_str());
            let number = if show {
                card.number.clone()
            } else {
                card.masked_number()
            };
            field("Number", &number);
            if let (Some(m), Some(y)) = (card.expiry_month, card.expiry_year) {
                let expiry = format!("{m:02}/{y}");
                if entry.is_expired() {
                    field("Expiry", &format!("{expiry} {}", style("(expired)").red()));
                } else {
                    field("Expiry", &expiry);
                }
            }
            field("CVV", &secret(&card.security_code, show));
        }
        EntryKind::Identity(identity) => {
            field("Name", &identity.full_name());
            field("Email", &identity.email);
            field("Phone", &identity.phone);
            field("Company", &identity.company);
            field("Address", &identity.full_address());
            field("SSN", &secret(&identity.ssn, show));
            field("Passport", &secret(&identity.passport_number, show));
            field("License", &secret(&identity.license_number, show));
        }
    }

    if let Some(folder) = entry.folder_id.and_then(|id| store.folder_path(id).ok()) {
        field("Folder", &folder);
    }
    if !entry.tags.is_empty() {
        field(
            "Tags",
            &entry.tags.iter().cloned().collect::<Vec<_>>().join(", "),
        );
    }
    field("Level", entry.security_level.as_str());
    field("Notes", &entry.notes);
    field("Updated", &entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string());
    if let Some(at) = entry.deleted_at {
        field("Deleted", &at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
}

fn colorize_score(score: u8) -> String {
    let text = format!("{score}/100");
    match score {
        80..=100 => style(text).green().bold().to_string(),
        50..=79 => style(text).yellow().bold().to_string(),
        _ => style(text).red().bold().to_string(),
    }
}

fn colorize_level(level: StrengthLevel) -> String {
    let text = level.to_string();
    if level.is_weak() {
        style(text).red().to_string()
    } else {
        style(text).green().to_string()
    }
}

pub fn print_strength(level: StrengthLevel, score: u8) {
    println!("  Strength: {} ({score}/100)", colorize_level(level));
}

/// Print the aggregate counters, then one row per flagged entry.
pub fn print_security_report(report: &SecurityReport) {
    println!("Security score: {}", colorize_score(report.score));
    println!();

    let mut counts = Table::new();
    counts.set_content_arrangement(ContentArrangement::Dynamic);
    counts.set_header(vec!["Check", "Logins"]);
    counts.add_row(vec!["Total".to_string(), report.total_logins.to_string()]);
    counts.add_row(vec![
        IssueKind::Weak.label().to_string(),
        report.weak_passwords.to_string(),
    ]);
    counts.add_row(vec![
        IssueKind::Duplicate.label().to_string(),
        report.duplicate_passwords.to_string(),
    ]);
    counts.add_row(vec![
        IssueKind::Old.label().to_string(),
        report.old_passwords.to_string(),
    ]);
    counts.add_row(vec![
        IssueKind::Compromised.label().to_string(),
        report.compromised_passwords.to_string(),
    ]);
    counts.add_row(vec![
        IssueKind::MissingTwoFactor.label().to_string(),
        report.without_2fa.to_string(),
    ]);
    println!("{counts}");

    if report.entries.is_empty() {
        return;
    }

    let mut flagged = Table::new();
    flagged.set_content_arrangement(ContentArrangement::Dynamic);
    flagged.set_header(vec!["Entry", "Issues"]);
    for item in &report.entries {
        let issues: Vec<&str> = item.issues.iter().map(|i| i.label()).collect();
        flagged.add_row(vec![item.entry_name.clone(), issues.join(", ")]);
    }
    println!("{flagged}");
}

pub fn print_statistics(stats: &VaultStatistics) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Entries".to_string(), stats.total_entries.to_string()]);
    for kind in EntryType::ALL {
        table.add_row(vec![
            format!("  {kind}"),
            stats.count_of(kind).to_string(),
        ]);
    }
    table.add_row(vec!["Favorites".to_string(), stats.favorites.to_string()]);
    table.add_row(vec!["In trash".to_string(), stats.deleted.to_string()]);
    table.add_row(vec!["Folders".to_string(), stats.folders.to_string()]);
    table.add_row(vec!["Expired cards".to_string(), stats.expired_cards.to_string()]);
    table.add_row(vec!["Weak passwords".to_string(), stats.weak_passwords.to_string()]);
    table.add_row(vec![
        "Reused passwords".to_string(),
        stats.duplicate_passwords.to_string(),
    ]);
    table.add_row(vec!["Security score".to_string(), colorize_score(stats.security_score)]);
    println!("{table}");
}

#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    let Ok(parsed) = op.parse::<Operation>() else {
        return op.to_string();
    };
    let styled = style(op);
    match parsed {
        _ if parsed.is_destructive() => styled.red(),
        Operation::ChangePassword => styled.yellow(),
        Operation::Import | Operation::Export => styled.cyan(),
        Operation::Copy => styled.magenta(),
        Operation::Edit | Operation::FolderRename | Operation::FolderMove => styled.blue(),
        _ => styled.green(),
    }
    .to_string()
}

/// Print audit rows, newest first.  The vault column only appears when
/// rows may come from more than one vault.
#[cfg(feature = "audit-log")]
pub fn print_audit_entries(rows: &[AuditEntry], show_vault: bool) {
    let mut header = vec!["Time", "Operation", "Entry", "Details"];
    if show_vault {
        header.insert(2, "Vault");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);

    for row in rows {
        let entry = row
            .entry_id
            .as_deref()
            .map_or("-", |id| id.get(..8).unwrap_or(id));
        let mut cells = vec![
            row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&row.operation),
            entry.to_string(),
            row.details.clone().unwrap_or_else(|| "-".to_string()),
        ];
        if show_vault {
            cells.insert(2, row.vault.clone());
        }
        table.add_row(cells);
    }

    let destructive = rows
        .iter()
        .filter(|r| r.operation.parse::<Operation>().is_ok_and(Operation::is_destructive))
        .count();
    println!(
        "{} {}",
        style(format!("{} audit entries", rows.len())).bold(),
        style(format!("({destructive} destructive)")).dim()
    );
    println!("{table}");
}
