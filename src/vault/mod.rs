//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - The entry model: logins, notes, cards, identities (`entry`)
//! - Folders (`folder`)
//! - On-disk layout, sidecars and atomic writes (`format`)
//! - JSON import/export (`interchange`)
//! - `VaultStore`, the lock state machine and all operations (`store`)

pub mod entry;
pub mod folder;
pub mod format;
pub mod interchange;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{
    CardBrand, CardData, EntryKind, EntryType, IdentityData, LoginData, SecureNoteData,
    SecurityLevel, VaultEntry,
};
pub use folder::VaultFolder;
pub use format::VaultPaths;
pub use interchange::ImportReport;
pub use store::{LockState, SharedVault, VaultStore};
