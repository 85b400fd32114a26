//! `credvault export`: write the vault's entries as interchange JSON.
//!
//! Plain exports are readable JSON containing every secret.  With
//! `--encrypted` the JSON is sealed under a separate export password and
//! can only be read back by `credvault import --encrypted`.

use std::fs;
use std::io::Write;
use std::path::Path;

use zeroize::Zeroize;

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{open_vault, prompt_new_password, Cli, EXPORT_PASSWORD_ENV};
use crate::errors::{CredVaultError, Result};

/// Execute the `export` command.
pub fn execute(
    cli: &Cli,
    output_path: Option<&Path>,
    include_deleted: bool,
    encrypted: bool,
) -> Result<()> {
    if let Some(path) = output_path {
        refuse_vault_target(cli, path)?;
    }

    let mut store = open_vault(cli)?;

    let count = store
        .entries()?
        .iter()
        .filter(|e| include_deleted || !e.deleted)
        .count();

    let mut content: Vec<u8> = if encrypted {
        let password = prompt_new_password(EXPORT_PASSWORD_ENV, "Choose an export password")?;
        store.export_encrypted(&password, include_deleted)?
    } else {
        store.export_json(include_deleted)?.into_bytes()
    };
    store.lock()?;

    audit::log_audit(
        cli,
        Operation::Export,
        None,
        Some(&format!(
            "{count} entries{}",
            if encrypted { ", encrypted" } else { "" }
        )),
    );

    // Write to file or stdout.
    let written = match output_path {
        Some(path) => fs::write(path, &content).map(|()| {
            output::success(&format!("Exported {count} entries to {}", path.display()));
            if !encrypted {
                output::warning("The export file holds every secret in plain text.");
            }
        }),
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&content).and_then(|()| writeln!(stdout))
        }
    };
    content.zeroize();
    written?;

    Ok(())
}

/// Exporting over the vault or one of its sidecars would destroy it.
fn refuse_vault_target(cli: &Cli, target: &Path) -> Result<()> {
    let paths = crate::vault::VaultPaths::new(&cli.vault);
    let protected = [&paths.main, &paths.salt, &paths.hash, &paths.settings, &paths.backup];
    if protected.iter().any(|p| p.as_path() == target) {
        return Err(CredVaultError::CommandFailed(format!(
            "refusing to overwrite vault file {}",
            target.display()
        )));
    }
    Ok(())
}
