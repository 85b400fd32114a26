//! `credvault delete`: move an entry to the trash, or erase it.

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{confirm, open_vault, resolve_entry, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, query: &str, permanent: bool, force: bool) -> Result<()> {
    let mut store = open_vault(cli)?;

    // A permanent delete may target something already in the trash.
    let id = match resolve_entry(&store, query, false) {
        Ok(id) => id,
        Err(_) if permanent => resolve_entry(&store, query, true)?,
        Err(e) => return Err(e),
    };
    let name = store.get_entry(id)?.name;

    // Unless --force is set, ask for confirmation before erasing.
    if permanent && !force && !confirm(&format!("Permanently erase '{name}'?"), false)? {
        store.lock()?;
        output::info("Cancelled.");
        return Ok(());
    }

    if permanent {
        store.permanently_delete_entry(id)?;
    } else {
        store.delete_entry(id)?;
    }
    store.lock()?;

    if permanent {
        audit::log_audit(cli, Operation::Erase, Some(id), None);
        output::success(&format!("Erased '{name}'"));
    } else {
        audit::log_audit(cli, Operation::Delete, Some(id), None);
        output::success(&format!("Moved '{name}' to the trash"));
        output::tip("Run `credvault restore <NAME>` to bring it back.");
    }

    Ok(())
}
