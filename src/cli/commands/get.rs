//! `credvault get`: show one entry, optionally copying its secret.

use std::thread;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{open_vault, resolve_entry, Cli};
use crate::errors::{CredVaultError, Result};
use crate::vault::{EntryKind, VaultEntry};

/// Execute the `get` command.
pub fn execute(cli: &Cli, query: &str, show: bool, copy: bool) -> Result<()> {
    let mut store = open_vault(cli)?;

    let id = resolve_entry(&store, query, false)?;
    let mut entry = store.get_entry(id)?;
    output::print_entry(&store, &entry, show);

    let clear_after = store.settings().clipboard_clear_secs;
    let copied = if copy {
        primary_secret(&entry).map(|s| Zeroizing::new(s.to_string()))
    } else {
        None
    };
    entry.wipe_secrets();

    // Lock before waiting on the clipboard so the key is not held meanwhile.
    store.lock()?;

    if copy {
        let secret = copied.ok_or_else(|| {
            CredVaultError::CommandFailed("this entry has no secret to copy".into())
        })?;
        copy_to_clipboard(&secret, clear_after)?;
        audit::log_audit(cli, Operation::Copy, Some(id), None);
    }

    Ok(())
}

/// The value `--copy` puts on the clipboard.
fn primary_secret(entry: &VaultEntry) -> Option<&str> {
    let value = match &entry.kind {
        EntryKind::Login(login) => login.password.as_str(),
        EntryKind::SecureNote(note) => note.content.as_str(),
        EntryKind::Card(card) => card.number.as_str(),
        EntryKind::Identity(_) => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// Copy `secret`, then clear it after `clear_after` seconds if the
/// clipboard still holds it.  `0` leaves it in place.
fn copy_to_clipboard(secret: &str, clear_after: u64) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| CredVaultError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(secret.to_string())
        .map_err(|e| CredVaultError::CommandFailed(format!("clipboard write: {e}")))?;

    if clear_after == 0 {
        output::success("Copied to clipboard.");
        return Ok(());
    }

    output::success(&format!(
        "Copied to clipboard. Clearing in {clear_after}s (Ctrl+C to keep it)."
    ));
    thread::sleep(Duration::from_secs(clear_after));

    let unchanged = clipboard
        .get_text()
        .map(|current| Zeroizing::new(current).as_str() == secret)
        .unwrap_or(false);
    if unchanged {
        clipboard
            .clear()
            .map_err(|e| CredVaultError::CommandFailed(format!("clipboard clear: {e}")))?;
        output::info("Clipboard cleared.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::IdentityData;

    #[test]
    fn primary_secret_per_kind() {
        let login = VaultEntry::login("GitHub", "octo", "pw");
        assert_eq!(primary_secret(&login), Some("pw"));

        let note = VaultEntry::secure_note("Wifi", "hunter2");
        assert_eq!(primary_secret(&note), Some("hunter2"));

        let card = VaultEntry::card("Visa", "A", "4111111111111111");
        assert_eq!(primary_secret(&card), Some("4111111111111111"));

        let identity = VaultEntry::identity("Me", IdentityData::default());
        assert_eq!(primary_secret(&identity), None);

        let empty = VaultEntry::login("Blank", "u", "");
        assert_eq!(primary_secret(&empty), None);
    }
}
