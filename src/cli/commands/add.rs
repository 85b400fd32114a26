//! `credvault add`: store a new login, note, card or identity.

use crate::audit::{self, Operation};
use crate::cli::output;
use crate::cli::{open_vault, prompt_secret, resolve_folder, AddKind, Cli, EntryMetaArgs};
use crate::errors::{CredVaultError, Result};
use crate::security::{analyze_password, generate_password, PasswordOptions};
use crate::vault::{
    CardBrand, CardData, EntryKind, IdentityData, LoginData, SecureNoteData, VaultEntry,
    VaultStore,
};

/// Execute the `add` command.
pub fn execute(cli: &Cli, kind: &AddKind) -> Result<()> {
    let mut store = open_vault(cli)?;

    let (entry, meta) = match kind {
        AddKind::Login {
            name,
            username,
            password,
            generate,
            email,
            urls,
            totp,
            meta,
        } => {
            let password = if *generate {
                generate_password(&PasswordOptions::default())?
            } else if let Some(pw) = password {
                pw.clone()
            } else {
                prompt_secret("CREDVAULT_ENTRY_PASSWORD", &format!("Password for '{name}'"))?
                    .to_string()
            };

            let analysis = analyze_password(&password);
            if analysis.level.is_weak() {
                output::warning(&format!("This password is {}.", analysis.level));
            }

            let mut login = LoginData {
                username: username.clone(),
                password,
                email: email.clone(),
                totp_secret: totp.clone(),
                ..LoginData::default()
            };
            for url in urls {
                login.add_url(url);
            }
            (VaultEntry::new(name, EntryKind::Login(login)), meta)
        }

        AddKind::Note {
            name,
            content,
            markdown,
            meta,
        } => {
            let content = match content {
                Some(c) => c.clone(),
                None => prompt_text("Note content")?,
            };
            let note = SecureNoteData {
                content,
                is_markdown: *markdown,
            };
            (VaultEntry::new(name, EntryKind::SecureNote(note)), meta)
        }

        AddKind::Card {
            name,
            holder,
            number,
            expiry,
            cvv,
            meta,
        } => {
            let number = match number {
                Some(n) => n.clone(),
                None => prompt_secret("CREDVAULT_CARD_NUMBER", "Card number")?.to_string(),
            };
            let (expiry_month, expiry_year) = match expiry {
                Some(raw) => {
                    let (m, y) = parse_expiry(raw)?;
                    (Some(m), Some(y))
                }
                None => (None, None),
            };
            let card = CardData {
                cardholder_name: holder.clone(),
                brand: CardBrand::detect(&number),
                number,
                expiry_month,
                expiry_year,
                security_code: cvv.clone(),
            };
            (VaultEntry::new(name, EntryKind::Card(card)), meta)
        }

        AddKind::Identity {
            name,
            first_name,
            last_name,
            email,
            phone,
            company,
            meta,
        } => {
            let identity = IdentityData {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                company: company.clone(),
                ..IdentityData::default()
            };
            (VaultEntry::identity(name, identity), meta)
        }
    };

    let entry = apply_meta(&store, entry, meta)?;
    let kind = entry.entry_type();
    let name = entry.name.clone();
    let id = store.add_entry(entry)?;
    store.lock()?;

    audit::log_audit(cli, Operation::Add, Some(id), Some(&kind.to_string()));
    output::success(&format!("Added {kind} '{name}' ({})", &id.to_string()[..8]));

    Ok(())
}

fn apply_meta(store: &VaultStore, mut entry: VaultEntry, meta: &EntryMetaArgs) -> Result<VaultEntry> {
    if let Some(notes) = &meta.notes {
        entry = entry.with_notes(notes.clone());
    }
    entry = entry.with_tags(meta.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()));
    if let Some(folder) = &meta.folder {
        entry = entry.with_folder(resolve_folder(store, folder)?);
    }
    if meta.favorite {
        entry = entry.with_favorite(true);
    }
    if let Some(level) = meta.level {
        entry = entry.with_security_level(level);
    }
    Ok(entry)
}

fn prompt_text(prompt: &str) -> Result<String> {
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Parse `MM/YY` or `MM/YYYY`.
fn parse_expiry(raw: &str) -> Result<(u8, u16)> {
    let invalid =
        || CredVaultError::CommandFailed(format!("invalid expiry '{raw}' — use MM/YY or MM/YYYY"));

    let (month, year) = raw.trim().split_once('/').ok_or_else(invalid)?;
    let month: u8 = month.trim().parse().map_err(|_| invalid())?;
    let year: u16 = year.trim().parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((month, year))
}
