//! Trash maintenance: `restore`, `cleanup` and `empty-trash`.

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{confirm, open_vault, resolve_entry, Cli};
use crate::errors::Result;

/// Execute the `restore` command.
pub fn restore(cli: &Cli, query: &str) -> Result<()> {
    let mut store = open_vault(cli)?;

    let id = resolve_entry(&store, query, true)?;
    store.restore_entry(id)?;
    let name = store.get_entry(id)?.name;
    store.lock()?;

    audit::log_audit(cli, Operation::Restore, Some(id), None);
    output::success(&format!("Restored '{name}'"));
    Ok(())
}

/// Execute the `cleanup` command.
pub fn cleanup(cli: &Cli, days: Option<u32>) -> Result<()> {
    let mut store = open_vault(cli)?;

    let days = days.unwrap_or(store.settings().retention_days);
    let removed = store.cleanup_deleted(days)?;
    store.lock()?;

    if removed == 0 {
        output::info(&format!("Nothing in the trash is older than {days} days."));
    } else {
        audit::log_audit(
            cli,
            Operation::Cleanup,
            None,
            Some(&format!("{removed} erased, retention {days}d")),
        );
        output::success(&format!("Erased {removed} trashed entries older than {days} days"));
    }
    Ok(())
}

/// Execute the `empty-trash` command.
pub fn empty(cli: &Cli, force: bool) -> Result<()> {
    let mut store = open_vault(cli)?;

    let count = store.entries()?.iter().filter(|e| e.deleted).count();
    if count == 0 {
        store.lock()?;
        output::info("The trash is empty.");
        return Ok(());
    }

    if !force && !confirm(&format!("Permanently erase {count} trashed entries?"), false)? {
        store.lock()?;
        output::info("Cancelled.");
        return Ok(());
    }

    let removed = store.empty_trash()?;
    store.lock()?;

    audit::log_audit(cli, Operation::EmptyTrash, None, Some(&format!("{removed} erased")));
    output::success(&format!("Erased {removed} trashed entries"));
    Ok(())
}
