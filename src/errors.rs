use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Failures of the key-derivation and cipher primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Weak key-derivation parameters: {0}")]
    WeakParameters(String),

    #[error("Malformed ciphertext envelope: {0}")]
    MalformedInput(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
}

/// Master-password authentication failures.
///
/// These are expected outcomes of user input, not programming errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid master password")]
    InvalidPassword,
}

/// Vault state-machine and lookup errors.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault is locked — unlock it with the master password first")]
    Locked,

    #[error("Vault is already unlocked")]
    AlreadyUnlocked,

    #[error("A vault already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("No vault has been initialized at {0}")]
    NotInitialized(PathBuf),

    #[error("Entry {0} not found")]
    EntryNotFound(Uuid),

    #[error("Entry {0} already exists")]
    DuplicateEntry(Uuid),

    #[error("Entry {0} is not in the trash")]
    EntryNotDeleted(Uuid),

    #[error("Entry {0} is a {1} entry — {2}")]
    TypeMismatch(Uuid, &'static str, String),

    #[error("Folder {0} not found")]
    FolderNotFound(Uuid),

    #[error("Moving folder {0} under {1} would create a cycle")]
    FolderCycle(Uuid, Uuid),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

/// Unparseable or unknown-typed records found while loading or importing.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown entry type '{0}'")]
    UnknownEntryType(String),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unsupported vault document version {found} (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

/// I/O failures reading or writing vault artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Inconsistent vault state on disk: {0}")]
    InconsistentState(String),
}

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- TOTP collaborator errors ---
    #[error("TOTP error: {0}")]
    Totp(String),

    #[error("Invalid generator options: {0}")]
    GeneratorOptions(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    Audit(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl From<std::io::Error> for CredVaultError {
    fn from(err: std::io::Error) -> Self {
        CredVaultError::Storage(StorageError::Io(err))
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
