//! `credvault edit`: change fields of an existing entry.
//!
//! Only the flags that are passed are applied; everything else is kept.
//! Password changes go through the entry's history so the previous
//! password stays recoverable.

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{open_vault, prompt_secret, resolve_folder, Cli, EditArgs};
use crate::errors::{CredVaultError, Result};
use crate::security::{analyze_password, generate_password, PasswordOptions};
use crate::vault::{VaultEntry, VaultStore};

/// Execute the `edit` command.
pub fn execute(cli: &Cli, args: &EditArgs) -> Result<()> {
    let mut store = open_vault(cli)?;

    let id = crate::cli::resolve_entry(&store, &args.entry, false)?;
    let mut entry = store.get_entry(id)?;
    let changes = apply_edits(&store, &mut entry, args)?;

    if changes.is_empty() {
        entry.wipe_secrets();
        store.lock()?;
        output::info("Nothing to change.");
        output::tip("Pass at least one field flag, e.g. `--username` or `--password`.");
        return Ok(());
    }

    let name = entry.name.clone();
    store.update_entry(entry)?;
    store.lock()?;

    audit::log_audit(cli, Operation::Edit, Some(id), Some(&changes.join(", ")));
    output::success(&format!("Updated '{name}': {}", changes.join(", ")));

    Ok(())
}

/// Apply every flag in `args` to `entry`.  Returns the changed field names.
fn apply_edits(
    store: &VaultStore,
    entry: &mut VaultEntry,
    args: &EditArgs,
) -> Result<Vec<&'static str>> {
    let mut changes = Vec::new();

    if let Some(name) = &args.name {
        entry.name = name.clone();
        changes.push("name");
    }
    if let Some(notes) = &args.notes {
        entry.notes = notes.clone();
        changes.push("notes");
    }
    if let Some(favorite) = args.favorite {
        entry.favorite = favorite;
        changes.push("favorite");
    }
    if let Some(level) = args.level {
        entry.security_level = level;
        changes.push("level");
    }
    if let Some(folder) = &args.folder {
        entry.folder_id = if folder.is_empty() {
            None
        } else {
            Some(resolve_folder(store, folder)?)
        };
        changes.push("folder");
    }

    let mut tagged = false;
    for tag in &args.add_tag {
        tagged |= entry.add_tag(tag.trim());
    }
    for tag in &args.remove_tag {
        tagged |= entry.remove_tag(tag.trim());
    }
    if tagged {
        changes.push("tags");
    }

    let mut urls_added = false;
    for url in &args.add_url {
        urls_added |= entry.add_url(url)?;
    }
    if urls_added {
        changes.push("urls");
    }

    if args.username.is_some() || args.email.is_some() {
        let not_login = CredVaultError::CommandFailed(format!(
            "'{}' is a {} entry; --username and --email apply to logins only",
            entry.name,
            entry.entry_type()
        ));
        let login = entry.as_login_mut().ok_or(not_login)?;
        if let Some(username) = &args.username {
            login.username = username.clone();
            changes.push("username");
        }
        if let Some(email) = &args.email {
            login.email = email.clone();
            changes.push("email");
        }
    }

    let new_password = if args.generate {
        Some(generate_password(&PasswordOptions::default())?)
    } else {
        match args.password.as_deref() {
            Some("") => Some(prompt_secret("CREDVAULT_ENTRY_PASSWORD", "New password")?.to_string()),
            Some(pw) => Some(pw.to_string()),
            None => None,
        }
    };
    if let Some(password) = new_password {
        let analysis = analyze_password(&password);
        if analysis.level.is_weak() {
            output::warning(&format!("The new password is {}.", analysis.level));
        }
        entry.change_password(password)?;
        changes.push("password");
    }

    Ok(changes)
}
