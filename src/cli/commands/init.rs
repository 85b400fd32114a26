//! `credvault init`: create a new, empty vault.

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, PASSWORD_ENV};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = VaultStore::open(&cli.vault)?;

    // 1. Refuse early so the user is not asked for a password twice.
    if store.is_initialized()? {
        output::tip("Run `credvault list` to see what the existing vault holds.");
        return Err(crate::errors::VaultError::AlreadyInitialized(cli.vault.clone()).into());
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password(PASSWORD_ENV, "Choose a master password")?;

    // 3. Write the vault, salt, verifier and settings files.
    store.initialize(&password)?;
    store.lock()?;

    audit::log_audit(cli, Operation::Init, None, Some("vault created"));

    output::success(&format!("Vault created at {}", cli.vault.display()));
    output::tip("Run `credvault add login <NAME>` to store your first credential.");
    output::tip("Run `credvault generate` for a strong random password.");

    Ok(())
}
