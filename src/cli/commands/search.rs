//! `credvault search`: filter entries by text, type, tags and security checks.

use crate::cli::output;
use crate::cli::{open_vault, resolve_folder, Cli, SearchArgs};
use crate::errors::Result;
use crate::search::VaultFilter;
use crate::vault::VaultStore;

/// Execute the `search` command.
pub fn execute(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let mut store = open_vault(cli)?;

    let filter = build_filter(&store, args)?;
    let hits = store.search(&filter)?;
    output::print_entries_table(&store, &hits);
    if !hits.is_empty() {
        output::info(&format!("{} matching entries", hits.len()));
    }

    store.lock()
}

fn build_filter(store: &VaultStore, args: &SearchArgs) -> Result<VaultFilter> {
    let mut filter = VaultFilter::new();
    if let Some(query) = args.query.as_deref().filter(|q| !q.trim().is_empty()) {
        filter = filter.text(query);
    }
    for kind in &args.types {
        filter = filter.of_type(*kind);
    }
    for tag in &args.tags {
        filter = filter.tag(tag.clone());
    }
    if let Some(folder) = &args.folder {
        filter = filter.in_folder(resolve_folder(store, folder)?);
    }
    if args.favorites {
        filter = filter.favorites();
    }
    if let Some(level) = args.min_level {
        filter = filter.min_level(level);
    }
    if args.weak {
        filter = filter.weak();
    }
    if args.no_2fa {
        filter = filter.without_two_factor();
    }
    if args.expired {
        filter = filter.expired();
    }
    if let Some(days) = args.older_than {
        filter = filter.older_than(days);
    }
    if args.deleted {
        filter = filter.deleted();
    }
    Ok(filter)
}
