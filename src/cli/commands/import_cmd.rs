//! `credvault import`: merge entries from an interchange file.
//!
//! Accepts the JSON written by `credvault export`, or the sealed form
//! written by `export --encrypted`.  Records that fail validation are
//! skipped and listed; everything else is merged.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{open_vault, prompt_secret, Cli, EXPORT_PASSWORD_ENV};
use crate::errors::{CredVaultError, Result};
use crate::vault::interchange::RecordKind;
use crate::vault::ImportReport;

/// Execute the `import` command.
pub fn execute(cli: &Cli, source: &Path, encrypted: bool) -> Result<()> {
    if !source.exists() {
        return Err(CredVaultError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }
    let raw = Zeroizing::new(fs::read(source)?);

    let mut store = open_vault(cli)?;

    let report = if encrypted {
        let password = prompt_secret(EXPORT_PASSWORD_ENV, "Export password")?;
        store.import_encrypted(&raw, &password)?
    } else {
        let json = std::str::from_utf8(&raw).map_err(|_| {
            CredVaultError::CommandFailed(format!(
                "{} is not UTF-8 text; pass --encrypted for sealed exports",
                source.display()
            ))
        })?;
        store.import_json(json)?
    };
    store.lock()?;

    audit::log_audit(
        cli,
        Operation::Import,
        None,
        Some(&format!(
            "{} entries, {} folders, {} skipped",
            report.imported,
            report.folders_imported,
            report.skipped.len()
        )),
    );
    print_report(&report, source);

    Ok(())
}

fn print_report(report: &ImportReport, source: &Path) {
    output::success(&format!(
        "Imported {} entries and {} folders from {}",
        report.imported,
        report.folders_imported,
        source.display()
    ));
    for skipped in &report.skipped {
        let kind = match skipped.kind {
            RecordKind::Item => "item",
            RecordKind::Folder => "folder",
        };
        output::warning(&format!(
            "Skipped {kind} #{}: {}",
            skipped.index, skipped.reason
        ));
    }
}
