//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::audit::Operation;
use crate::errors::{CredVaultError, Result};
use crate::vault::{SecurityLevel, VaultEntry, VaultStore};

/// Minimum password length to prevent trivially weak master passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the master password (CI/scripting).
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// New master password for `change-password` in non-interactive use.
pub const NEW_PASSWORD_ENV: &str = "CREDVAULT_NEW_PASSWORD";

/// Password protecting an encrypted export.
pub const EXPORT_PASSWORD_ENV: &str = "CREDVAULT_EXPORT_PASSWORD";

/// CredVault CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(name = "credvault", about = "Local encrypted credential vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the vault file
    #[arg(
        long,
        env = "CREDVAULT_PATH",
        default_value = ".credvault/vault.cvault",
        global = true
    )]
    pub vault: PathBuf,
}

/// Metadata flags shared by every `add` subcommand.
#[derive(clap::Args, Debug, Default)]
pub struct EntryMetaArgs {
    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Comma-separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Folder id or name
    #[arg(long)]
    pub folder: Option<String>,

    /// Mark as favorite
    #[arg(long)]
    pub favorite: bool,

    /// Security level: critical, high, medium, low
    #[arg(long)]
    pub level: Option<SecurityLevel>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Add an entry
    Add {
        #[command(subcommand)]
        kind: AddKind,
    },

    /// List entries
    List {
        /// Show the trash instead of live entries
        #[arg(long)]
        deleted: bool,
    },

    /// Search entries with filters
    Search(SearchArgs),

    /// Show one entry
    Get {
        /// Entry id, id prefix, or name
        entry: String,
        /// Reveal secret fields
        #[arg(long)]
        show: bool,
        /// Copy the password (or main secret) to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Edit an entry
    Edit(EditArgs),

    /// Move an entry to the trash (or erase it)
    Delete {
        /// Entry id, id prefix, or name
        entry: String,
        /// Erase immediately instead of moving to the trash
        #[arg(long)]
        permanent: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Restore an entry from the trash
    Restore {
        /// Entry id, id prefix, or name
        entry: String,
    },

    /// Erase trashed entries older than the retention window
    Cleanup {
        /// Retention window in days (default: from settings)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Erase everything in the trash
    EmptyTrash {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the master password
    ChangePassword,

    /// Import entries from an interchange file
    Import {
        /// Path to the file to import
        file: PathBuf,
        /// The file was written by `export --encrypted`
        #[arg(long)]
        encrypted: bool,
    },

    /// Export entries to a file or stdout
    Export {
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include trashed entries
        #[arg(long)]
        include_deleted: bool,
        /// Encrypt the export with a separate password
        #[arg(long)]
        encrypted: bool,
    },

    /// Show the security report
    Report,

    /// Show vault statistics
    Stats,

    /// Generate a random password
    Generate(GenerateArgs),

    /// Manage folders
    Folder {
        #[command(subcommand)]
        action: FolderAction,
    },

    /// View the audit log of vault operations
    Audit(AuditArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

/// Entry kinds accepted by `add`.
#[derive(clap::Subcommand)]
pub enum AddKind {
    /// A website or service login
    Login {
        name: String,
        #[arg(short, long, default_value = "")]
        username: String,
        /// Password (omit for an interactive prompt)
        #[arg(short, long)]
        password: Option<String>,
        /// Generate a random password instead
        #[arg(short, long, conflicts_with = "password")]
        generate: bool,
        #[arg(long, default_value = "")]
        email: String,
        /// URL (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,
        /// TOTP secret or otpauth:// URL
        #[arg(long)]
        totp: Option<String>,
        #[command(flatten)]
        meta: EntryMetaArgs,
    },

    /// A secure note
    Note {
        name: String,
        /// Note body (omit for an interactive prompt)
        #[arg(short, long)]
        content: Option<String>,
        /// Body is markdown
        #[arg(long)]
        markdown: bool,
        #[command(flatten)]
        meta: EntryMetaArgs,
    },

    /// A payment card
    Card {
        name: String,
        #[arg(long, default_value = "")]
        holder: String,
        /// Card number (omit for an interactive prompt)
        #[arg(long)]
        number: Option<String>,
        /// Expiry as MM/YY or MM/YYYY
        #[arg(long)]
        expiry: Option<String>,
        /// Security code
        #[arg(long, default_value = "")]
        cvv: String,
        #[command(flatten)]
        meta: EntryMetaArgs,
    },

    /// Personal identity details
    Identity {
        name: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        company: String,
        #[command(flatten)]
        meta: EntryMetaArgs,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct SearchArgs {
    /// Text to match against names, notes, usernames and other fields
    pub query: Option<String>,
    /// Entry type (repeatable): login, note, card, identity
    #[arg(long = "type")]
    pub types: Vec<crate::vault::EntryType>,
    /// Required tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Folder id or name
    #[arg(long)]
    pub folder: Option<String>,
    #[arg(long)]
    pub favorites: bool,
    /// Minimum security level
    #[arg(long)]
    pub min_level: Option<SecurityLevel>,
    /// Only logins with weak passwords
    #[arg(long)]
    pub weak: bool,
    /// Only logins without a TOTP secret
    #[arg(long = "no-2fa")]
    pub no_2fa: bool,
    /// Only expired cards
    #[arg(long)]
    pub expired: bool,
    /// Only logins whose password is older than N days
    #[arg(long)]
    pub older_than: Option<i64>,
    /// Search the trash
    #[arg(long)]
    pub deleted: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct EditArgs {
    /// Entry id, id prefix, or name
    pub entry: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Set a new password (omit value for an interactive prompt)
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub password: Option<String>,
    /// Replace the password with a generated one
    #[arg(long, conflicts_with = "password")]
    pub generate: bool,
    #[arg(long)]
    pub favorite: Option<bool>,
    #[arg(long, value_delimiter = ',')]
    pub add_tag: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub remove_tag: Vec<String>,
    #[arg(long)]
    pub add_url: Vec<String>,
    /// Move to folder (id or name); pass "" to unfile
    #[arg(long)]
    pub folder: Option<String>,
    #[arg(long)]
    pub level: Option<SecurityLevel>,
}

/// Filters for `credvault audit`.
#[derive(clap::Args, Debug, Default)]
pub struct AuditArgs {
    /// Number of rows to show
    #[arg(long, default_value = "50")]
    pub last: usize,
    /// Only rows newer than this: a span (30m, 24h, 7d, 2w) or a date (2024-05-01)
    #[arg(long)]
    pub since: Option<String>,
    /// Only rows for this operation (e.g. add, delete, change-password)
    #[arg(long = "op")]
    pub operation: Option<Operation>,
    /// Only rows touching this entry id (full or at least 4 leading characters)
    #[arg(long)]
    pub entry: Option<String>,
    /// Include rows recorded for other vaults in the same directory
    #[arg(long)]
    pub all_vaults: bool,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[arg(short, long, default_value = "20")]
    pub length: usize,
    #[arg(long)]
    pub no_lowercase: bool,
    #[arg(long)]
    pub no_uppercase: bool,
    #[arg(long)]
    pub no_digits: bool,
    #[arg(long)]
    pub no_symbols: bool,
    /// Leave out look-alike characters such as l, 1, O and 0
    #[arg(long)]
    pub exclude_ambiguous: bool,
}

/// Folder subcommands.
#[derive(clap::Subcommand)]
pub enum FolderAction {
    /// Create a folder
    Add {
        name: String,
        /// Parent folder id or name
        #[arg(long)]
        parent: Option<String>,
    },

    /// List folders as paths
    List,

    /// Rename a folder
    Rename { folder: String, name: String },

    /// Move a folder under another one (or to the top level)
    Move {
        folder: String,
        /// New parent id or name; omit for the top level
        #[arg(long)]
        parent: Option<String>,
    },

    /// Delete a folder; its entries become unfiled
    Delete {
        folder: String,
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

fn password_from_env(var: &str) -> Option<Zeroizing<String>> {
    match std::env::var(var) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Get the master password, trying in order:
/// 1. `CREDVAULT_PASSWORD` env var (CI/scripting)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    prompt_secret(PASSWORD_ENV, "Enter master password")
}

/// Read a secret from `env_var`, falling back to a hidden prompt.
pub fn prompt_secret(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation.
///
/// Also respects `env_var` for scripted/CI usage.
/// Enforces a minimum password length.
pub fn prompt_new_password(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        if pw.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredVaultError::CommandFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt(prompt)
            .with_confirmation("Confirm password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Load the store for `--vault` and unlock it with the master password.
pub fn open_vault(cli: &Cli) -> Result<VaultStore> {
    let password = prompt_password()?;
    open_vault_with(cli, &password)
}

/// Like `open_vault`, for callers that need the password afterwards.
pub fn open_vault_with(cli: &Cli, password: &str) -> Result<VaultStore> {
    let mut store = VaultStore::open(&cli.vault)?;
    if !store.is_initialized()? {
        output::tip("Run `credvault init` to create a vault first.");
    }
    store.unlock(password)?;
    Ok(store)
}

/// Ask a yes/no question; `default` is used when the user just presses enter.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Shortest id prefix accepted when looking entries up.
const MIN_ID_PREFIX: usize = 4;

/// Find one entry by full id, id prefix, or case-insensitive name.
///
/// `deleted` selects which partition names and prefixes are matched in;
/// a full id matches regardless.
pub fn resolve_entry(store: &VaultStore, query: &str, deleted: bool) -> Result<Uuid> {
    let entries = store.entries()?;
    if let Ok(id) = Uuid::parse_str(query) {
        if entries.iter().any(|e| e.id == id) {
            return Ok(id);
        }
    }

    let candidates: Vec<&VaultEntry> = entries.iter().filter(|e| e.deleted == deleted).collect();
    let by_name: Vec<&VaultEntry> = candidates
        .iter()
        .copied()
        .filter(|e| e.name.eq_ignore_ascii_case(query))
        .collect();
    let matches = if by_name.is_empty() && query.len() >= MIN_ID_PREFIX {
        let prefix = query.to_ascii_lowercase();
        candidates
            .into_iter()
            .filter(|e| e.id.to_string().starts_with(&prefix))
            .collect()
    } else {
        by_name
    };

    match matches.as_slice() {
        [entry] => Ok(entry.id),
        [] => Err(CredVaultError::CommandFailed(format!(
            "no {}entry matches '{query}'",
            if deleted { "trashed " } else { "" }
        ))),
        many => Err(CredVaultError::CommandFailed(format!(
            "'{query}' matches {} entries — use the id instead",
            many.len()
        ))),
    }
}

/// Find one folder by full id, id prefix, or case-insensitive name.
pub fn resolve_folder(store: &VaultStore, query: &str) -> Result<Uuid> {
    let folders = store.folders()?;
    if let Ok(id) = Uuid::parse_str(query) {
        if folders.iter().any(|f| f.id == id) {
            return Ok(id);
        }
    }

    let mut matches: Vec<Uuid> = folders
        .iter()
        .filter(|f| f.name.eq_ignore_ascii_case(query))
        .map(|f| f.id)
        .collect();
    if matches.is_empty() && query.len() >= MIN_ID_PREFIX {
        let prefix = query.to_ascii_lowercase();
        matches = folders
            .iter()
            .filter(|f| f.id.to_string().starts_with(&prefix))
            .map(|f| f.id)
            .collect();
    }

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CredVaultError::CommandFailed(format!(
            "no folder matches '{query}'"
        ))),
        many => Err(CredVaultError::CommandFailed(format!(
            "'{query}' matches {} folders — use the id instead",
            many.len()
        ))),
    }
}
