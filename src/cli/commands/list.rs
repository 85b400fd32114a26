//! `credvault list`: show live entries, or the trash with `--deleted`.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;
use crate::vault::VaultEntry;

/// Execute the `list` command.
pub fn execute(cli: &Cli, deleted: bool) -> Result<()> {
    let mut store = open_vault(cli)?;

    let entries: Vec<&VaultEntry> = store
        .entries()?
        .iter()
        .filter(|e| e.deleted == deleted)
        .collect();

    if entries.is_empty() {
        if deleted {
            output::info("The trash is empty.");
        } else {
            output::info("No entries in this vault yet.");
            output::tip("Run `credvault add login <NAME>` to add your first credential.");
        }
    } else {
        output::print_entries_table(&store, &entries);
    }

    store.lock()
}
