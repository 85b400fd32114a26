//! `credvault folder`: create, list, rename, move and delete folders.

use comfy_table::{ContentArrangement, Table};

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{confirm, open_vault, resolve_folder, Cli, FolderAction};
use crate::errors::Result;

/// Execute a `folder` subcommand.
pub fn execute(cli: &Cli, action: &FolderAction) -> Result<()> {
    let mut store = open_vault(cli)?;

    match action {
        FolderAction::Add { name, parent } => {
            let parent_id = match parent {
                Some(p) => Some(resolve_folder(&store, p)?),
                None => None,
            };
            let id = store.add_folder(name, parent_id)?;
            let path = store.folder_path(id)?;
            store.lock()?;
            audit::log_audit(cli, Operation::FolderAdd, None, Some(&path));
            output::success(&format!("Created folder '{path}'"));
        }

        FolderAction::List => {
            let mut rows: Vec<(String, String, usize)> = Vec::new();
            for folder in store.folders()? {
                let count = store
                    .entries()?
                    .iter()
                    .filter(|e| !e.deleted && e.folder_id == Some(folder.id))
                    .count();
                rows.push((
                    folder.id.to_string()[..8].to_string(),
                    store.folder_path(folder.id)?,
                    count,
                ));
            }
            store.lock()?;

            if rows.is_empty() {
                output::info("No folders yet.");
                output::tip("Run `credvault folder add <NAME>` to create one.");
                return Ok(());
            }
            rows.sort_by(|a, b| a.1.cmp(&b.1));

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Id", "Path", "Entries"]);
            for (id, path, count) in rows {
                table.add_row(vec![id, path, count.to_string()]);
            }
            println!("{table}");
        }

        FolderAction::Rename { folder, name } => {
            let id = resolve_folder(&store, folder)?;
            store.rename_folder(id, name)?;
            let path = store.folder_path(id)?;
            store.lock()?;
            audit::log_audit(cli, Operation::FolderRename, None, Some(&path));
            output::success(&format!("Renamed folder to '{path}'"));
        }

        FolderAction::Move { folder, parent } => {
            let id = resolve_folder(&store, folder)?;
            let parent_id = match parent {
                Some(p) => Some(resolve_folder(&store, p)?),
                None => None,
            };
            store.move_folder(id, parent_id)?;
            let path = store.folder_path(id)?;
            store.lock()?;
            audit::log_audit(cli, Operation::FolderMove, None, Some(&path));
            output::success(&format!("Moved folder to '{path}'"));
        }

        FolderAction::Delete { folder, force } => {
            let id = resolve_folder(&store, folder)?;
            let path = store.folder_path(id)?;
            if !force
                && !confirm(
                    &format!("Delete folder '{path}'? Its entries become unfiled."),
                    false,
                )?
            {
                store.lock()?;
                output::info("Cancelled.");
                return Ok(());
            }
            store.delete_folder(id)?;
            store.lock()?;
            audit::log_audit(cli, Operation::FolderDelete, None, Some(&path));
            output::success(&format!("Deleted folder '{path}'"));
        }
    }

    Ok(())
}
