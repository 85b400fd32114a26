//! `credvault change-password`: re-key the vault under a new master password.
//!
//! Derives a fresh salt and key from the new password, re-encrypts the
//! whole collection, and replaces the salt and verifier sidecars.

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{open_vault_with, prompt_new_password, prompt_password, Cli, NEW_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `change-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    // 1. Unlock with the current password.
    output::info("Enter your current master password.");
    let old_password = prompt_password()?;
    let mut store = open_vault_with(cli, &old_password)?;

    // 2. Prompt for the new password.
    output::info("Choose your new master password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV, "New master password")?;

    // 3. Re-key and write everything atomically.
    store.change_master_password(&old_password, &new_password)?;
    let count = store.entries()?.len();
    store.lock()?;

    audit::log_audit(
        cli,
        Operation::ChangePassword,
        None,
        Some(&format!("{count} entries re-encrypted")),
    );
    output::success(&format!(
        "Master password changed ({count} entries re-encrypted)"
    ));

    Ok(())
}
