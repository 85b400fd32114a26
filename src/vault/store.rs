//! The vault store: lock state, the in-memory collection, and every
//! operation that reads or mutates it.
//!
//! `VaultStore` starts `Locked`.  `initialize` or `unlock` derive the key
//! and load the collection; `lock` persists, wipes and forgets it.  Each
//! successful mutation re-encrypts the whole document and replaces the
//! main file atomically.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use super::entry::{kind_label, EntryKind, VaultEntry};
use super::folder::{self, VaultFolder};
use super::format::{self, DiskState, VaultPaths, VerifierRecord};
use super::interchange::{self, ImportReport};
use crate::config::VaultSettings;
use crate::crypto::encryption::{decrypt, decrypt_with_key, encrypt, seal_envelope, split_envelope};
use crate::crypto::kdf::{generate_salt, SALT_LEN};
use crate::crypto::keys::MasterKey;
use crate::crypto::memory::constant_time_equals;
use crate::errors::{AuthError, CredVaultError, Result, StorageError, VaultError};
use crate::search::{self, VaultFilter};
use crate::security::report::{generate_security_report, SecurityReport};
use crate::security::stats::{compute_statistics, VaultStatistics};
use crate::totp::{self, TotpProvider};

/// A store shared between threads; one coarse lock guards everything.
pub type SharedVault = Arc<Mutex<VaultStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocked,
}

/// Everything that only exists while the vault is unlocked.
struct Session {
    /// HKDF entry key derived from the master key.
    key: MasterKey,
    salt: Vec<u8>,
    created_at: DateTime<Utc>,
    entries: Vec<VaultEntry>,
    folders: Vec<VaultFolder>,
    /// Unsaved changes; `lock` persists them before wiping.
    dirty: bool,
}

impl Session {
    fn entry_mut(&mut self, id: Uuid) -> Result<&mut VaultEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| VaultError::EntryNotFound(id).into())
    }

    fn require_folder(&self, id: Uuid) -> Result<()> {
        if self.folders.iter().any(|f| f.id == id) {
            Ok(())
        } else {
            Err(VaultError::FolderNotFound(id).into())
        }
    }

    fn folder_mut(&mut self, id: Uuid) -> Result<&mut VaultFolder> {
        self.folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| VaultError::FolderNotFound(id).into())
    }

    /// Encrypt the document under `key`, prefixed with `salt`.
    fn seal(&self, key: &MasterKey, salt: &[u8]) -> Result<Vec<u8>> {
        let plaintext = format::encode_document(self.created_at, &self.entries, &self.folders)?;
        seal_envelope(key.as_bytes(), salt, &plaintext)
    }

    fn purge(&mut self, mut predicate: impl FnMut(&VaultEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain_mut(|entry| {
            if predicate(&*entry) {
                entry.wipe_secrets();
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }
}

/// The collection as it was before a mutation.
struct Snapshot {
    entries: Vec<VaultEntry>,
    folders: Vec<VaultFolder>,
    dirty: bool,
}

impl Snapshot {
    fn take(session: &Session) -> Self {
        Self {
            entries: session.entries.clone(),
            folders: session.folders.clone(),
            dirty: session.dirty,
        }
    }

    /// Put the saved collection back; the discarded one is wiped on drop.
    fn restore(mut self, session: &mut Session) {
        std::mem::swap(&mut self.entries, &mut session.entries);
        std::mem::swap(&mut self.folders, &mut session.folders);
        session.dirty = self.dirty;
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        for entry in &mut self.entries {
            entry.wipe_secrets();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for entry in &mut self.entries {
            entry.wipe_secrets();
        }
        self.salt.zeroize();
    }
}

/// The main vault handle.
pub struct VaultStore {
    paths: VaultPaths,
    settings: VaultSettings,
    session: Option<Session>,
    last_activity: DateTime<Utc>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A locked store for the vault at `path`, with settings read from
    /// the TOML sidecar (defaults when it does not exist).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let paths = VaultPaths::new(path);
        let settings = VaultSettings::load(&paths.settings)?;
        Ok(Self::with_settings(paths.main.clone(), settings))
    }

    /// A locked store using `settings` instead of the sidecar.
    pub fn with_settings(path: impl Into<PathBuf>, settings: VaultSettings) -> Self {
        Self {
            paths: VaultPaths::new(path),
            settings,
            session: None,
            last_activity: Utc::now(),
        }
    }

    pub fn into_shared(self) -> SharedVault {
        Arc::new(Mutex::new(self))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.paths.main
    }

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn state(&self) -> LockState {
        if self.session.is_some() {
            LockState::Unlocked
        } else {
            LockState::Locked
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a complete vault exists on disk.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(format::inspect(&self.paths)? == DiskState::Complete)
    }

    /// Replace the settings and write them to the sidecar.
    pub fn update_settings(&mut self, settings: VaultSettings) -> Result<()> {
        settings.save(&self.paths.settings)?;
        self.settings = settings;
        Ok(())
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| VaultError::Locked.into())
    }

    // ------------------------------------------------------------------
    // Lock state machine
    // ------------------------------------------------------------------

    /// Create a new empty vault protected by `master_password` and leave
    /// it unlocked.
    pub fn initialize(&mut self, master_password: &str) -> Result<()> {
        if self.session.is_some() || format::inspect(&self.paths)? == DiskState::Complete {
            return Err(VaultError::AlreadyInitialized(self.paths.main.clone()).into());
        }
        self.settings.validate()?;

        let iterations = self.settings.kdf_iterations;
        let salt = generate_salt(SALT_LEN);
        let master = MasterKey::derive(master_password.as_bytes(), &salt, iterations)?;
        let record = VerifierRecord::new(iterations, &master.verifier()?);

        let session = Session {
            key: master.entry_key()?,
            salt,
            created_at: Utc::now(),
            entries: Vec::new(),
            folders: Vec::new(),
            dirty: false,
        };

        if !self.paths.settings.exists() {
            self.settings.save(&self.paths.settings)?;
        }
        let envelope = session.seal(&session.key, &session.salt)?;
        format::write_vault_set(&self.paths, &envelope, &session.salt, &record)?;

        self.session = Some(session);
        self.last_activity = Utc::now();
        info!(vault = %self.paths.main.display(), iterations, "vault initialized");
        Ok(())
    }

    /// Derive the key from `master_password`, check it against the stored
    /// verifier, and load the collection.
    pub fn unlock(&mut self, master_password: &str) -> Result<()> {
        if self.session.is_some() {
            return Err(VaultError::AlreadyUnlocked.into());
        }
        if format::inspect(&self.paths)? == DiskState::Absent {
            return Err(VaultError::NotInitialized(self.paths.main.clone()).into());
        }

        let record = format::read_verifier(&self.paths)?;
        let salt = format::read_salt(&self.paths)?;
        let master = MasterKey::derive(master_password.as_bytes(), &salt, record.iterations)?;
        if !master.matches_verifier(&record.verifier)? {
            warn!(vault = %self.paths.main.display(), "unlock rejected: wrong master password");
            return Err(AuthError::InvalidPassword.into());
        }

        let blob = format::read_main(&self.paths)?;
        let (envelope_salt, body) = split_envelope(&blob)?;
        if !constant_time_equals(envelope_salt, &salt) {
            return Err(StorageError::InconsistentState(
                "vault file salt does not match the salt sidecar".into(),
            )
            .into());
        }

        let key = master.entry_key()?;
        let plaintext = decrypt_with_key(key.as_bytes(), body)?;
        let document = format::decode_document(&plaintext)?;

        let mut session = Session {
            key,
            salt,
            created_at: document.created_at,
            entries: Vec::with_capacity(document.items.len()),
            folders: document.folders,
            dirty: false,
        };
        for item in document.items {
            session.entries.push(VaultEntry::from_value(item)?);
        }

        info!(
            vault = %self.paths.main.display(),
            entries = session.entries.len(),
            "vault unlocked"
        );
        self.session = Some(session);
        self.last_activity = Utc::now();
        Ok(())
    }

    /// Persist pending changes, wipe every secret, and forget the key.
    ///
    /// If the pending persist fails the error is returned and the store
    /// stays unlocked.
    pub fn lock(&mut self) -> Result<()> {
        let dirty = self.session()?.dirty;
        if dirty {
            self.persist()?;
        }
        // Dropping the session wipes entries and zeroizes the key.
        self.session = None;
        info!(vault = %self.paths.main.display(), "vault locked");
        Ok(())
    }

    /// Re-key the vault under `new_password` with a fresh salt.
    pub fn change_master_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        let session = self.session()?;

        let record = format::read_verifier(&self.paths)?;
        let current = MasterKey::derive(old_password.as_bytes(), &session.salt, record.iterations)?;
        if !current.matches_verifier(&record.verifier)? {
            warn!(vault = %self.paths.main.display(), "master password change rejected");
            return Err(AuthError::InvalidPassword.into());
        }

        let iterations = self.settings.kdf_iterations;
        let new_salt = generate_salt(SALT_LEN);
        let master = MasterKey::derive(new_password.as_bytes(), &new_salt, iterations)?;
        let new_key = master.entry_key()?;
        let new_record = VerifierRecord::new(iterations, &master.verifier()?);

        let envelope = session.seal(&new_key, &new_salt)?;
        format::write_vault_set(&self.paths, &envelope, &new_salt, &new_record)?;

        if let Some(session) = self.session.as_mut() {
            session.key = new_key;
            session.salt = new_salt;
            session.dirty = false;
        }
        self.last_activity = Utc::now();
        info!(vault = %self.paths.main.display(), iterations, "master password changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Activity / auto-lock
    // ------------------------------------------------------------------

    /// Time of the last successful operation.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Mark the vault as in use, postponing auto-lock.
    pub fn record_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the idle timeout has elapsed as of `now`.  The host is
    /// expected to call `lock` when this returns `true`.
    pub fn auto_lock_due(&self, now: DateTime<Utc>) -> bool {
        let secs = self.settings.auto_lock_secs;
        if self.session.is_none() || secs == 0 {
            return false;
        }
        let idle = i64::try_from(secs).unwrap_or(i64::MAX);
        now.signed_duration_since(self.last_activity) >= Duration::seconds(idle)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Re-encrypt the whole document and replace the main file.
    fn persist(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(VaultError::Locked)?;
        let result = session
            .seal(&session.key, &session.salt)
            .and_then(|envelope| format::write_main(&self.paths, &envelope));
        session.dirty = result.is_err();
        match &result {
            Ok(()) => debug!(entries = session.entries.len(), "vault persisted"),
            Err(e) => warn!(error = %e, "vault persist failed"),
        }
        result
    }

    /// Apply `change` to the unlocked session, then persist.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        self.mutate_then(change, |_| true)
    }

    /// Apply `change`, persisting only when `needs_persist` says so.
    ///
    /// If the change or the persist fails, the collection is put back as
    /// it was, so an `Err` always means nothing happened.
    fn mutate_then<T>(
        &mut self,
        change: impl FnOnce(&mut Session) -> Result<T>,
        needs_persist: impl FnOnce(&T) -> bool,
    ) -> Result<T> {
        let session = self.session.as_mut().ok_or(VaultError::Locked)?;
        let snapshot = Snapshot::take(session);
        let value = match change(session) {
            Ok(value) => value,
            Err(e) => {
                snapshot.restore(session);
                return Err(e);
            }
        };

        if needs_persist(&value) {
            if let Err(e) = self.persist() {
                if let Some(session) = self.session.as_mut() {
                    snapshot.restore(session);
                }
                return Err(e);
            }
        }
        self.last_activity = Utc::now();
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Entry mutations
    // ------------------------------------------------------------------

    /// Insert a new entry.  Returns its id.
    pub fn add_entry(&mut self, entry: VaultEntry) -> Result<Uuid> {
        self.mutate(|session| {
            entry
                .validate()
                .map_err(|e| VaultError::InvalidEntry(e.to_string()))?;
            if session.entries.iter().any(|e| e.id == entry.id) {
                return Err(VaultError::DuplicateEntry(entry.id).into());
            }
            if let Some(folder_id) = entry.folder_id {
                session.require_folder(folder_id)?;
            }
            let id = entry.id;
            debug!(%id, kind = %entry.entry_type(), "entry added");
            session.entries.push(entry);
            Ok(id)
        })
    }

    /// Replace an entry's contents with `updated`.
    ///
    /// The id, creation time and deletion state of the stored entry are
    /// kept.  Changing the variant is rejected.  A login password that
    /// changed without going through `change_password` is still recorded
    /// in the history.
    pub fn update_entry(&mut self, updated: VaultEntry) -> Result<()> {
        self.mutate(|session| {
            let id = updated.id;
            if let Some(folder_id) = updated.folder_id {
                session.require_folder(folder_id)?;
            }
            let slot = session.entry_mut(id)?;
            if slot.entry_type() != updated.entry_type() {
                return Err(VaultError::TypeMismatch(
                    id,
                    kind_label(slot.entry_type()),
                    format!("it cannot become a {}", kind_label(updated.entry_type())),
                )
                .into());
            }

            let now = Utc::now();
            let mut next = updated;
            next.created_at = slot.created_at;
            next.deleted = slot.deleted;
            next.deleted_at = slot.deleted_at;

            let unrecorded_change = next.password_last_changed == slot.password_last_changed;
            if let (EntryKind::Login(old), EntryKind::Login(new)) = (&slot.kind, &mut next.kind) {
                if unrecorded_change && old.password != new.password {
                    new.record_superseded(old.password.clone(), now);
                    next.password_last_changed = now;
                }
            }
            next.touch(now);
            next.validate()
                .map_err(|e| VaultError::InvalidEntry(e.to_string()))?;

            let mut previous = std::mem::replace(slot, next);
            previous.wipe_secrets();
            Ok(())
        })
    }

    /// Move an entry to the trash.  Deleting a trashed entry is a no-op.
    pub fn delete_entry(&mut self, id: Uuid) -> Result<()> {
        self.mutate(|session| {
            session.entry_mut(id)?.mark_deleted(Utc::now());
            Ok(())
        })
    }

    /// Bring an entry back from the trash.
    pub fn restore_entry(&mut self, id: Uuid) -> Result<()> {
        self.mutate(|session| {
            let entry = session.entry_mut(id)?;
            if !entry.deleted {
                return Err(VaultError::EntryNotDeleted(id).into());
            }
            entry.restore(Utc::now());
            Ok(())
        })
    }

    /// Erase an entry, trashed or not.
    pub fn permanently_delete_entry(&mut self, id: Uuid) -> Result<()> {
        self.mutate(|session| {
            if session.purge(|e| e.id == id) == 0 {
                return Err(VaultError::EntryNotFound(id).into());
            }
            Ok(())
        })
    }

    /// Erase trashed entries deleted more than `retention_days` ago.
    pub fn cleanup_deleted(&mut self, retention_days: u32) -> Result<usize> {
        self.cleanup_deleted_as_of(retention_days, Utc::now())
    }

    pub fn cleanup_deleted_as_of(&mut self, retention_days: u32, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::days(i64::from(retention_days));
        self.purge_trash(|entry| entry.deleted_at.is_some_and(|at| at < cutoff))
    }

    /// Erase everything in the trash.
    pub fn empty_trash(&mut self) -> Result<usize> {
        self.purge_trash(|_| true)
    }

    fn purge_trash(&mut self, expired: impl Fn(&VaultEntry) -> bool) -> Result<usize> {
        self.mutate_then(
            |session| {
                let removed = session.purge(|e| e.deleted && expired(e));
                if removed > 0 {
                    info!(removed, "purged trashed entries");
                }
                Ok(removed)
            },
            |removed| *removed > 0,
        )
    }

    pub fn set_favorite(&mut self, id: Uuid, favorite: bool) -> Result<()> {
        self.mutate(|session| {
            let entry = session.entry_mut(id)?;
            if entry.favorite != favorite {
                entry.favorite = favorite;
                entry.touch(Utc::now());
            }
            Ok(())
        })
    }

    /// Replace a login's password, keeping the old one in its history.
    pub fn change_entry_password(&mut self, id: Uuid, new_password: &str) -> Result<()> {
        self.mutate(|session| session.entry_mut(id)?.change_password(new_password).map_err(Into::into))
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    pub fn add_folder(&mut self, name: &str, parent_id: Option<Uuid>) -> Result<Uuid> {
        let name = validate_folder_name(name)?;
        self.mutate(|session| {
            if let Some(parent) = parent_id {
                session.require_folder(parent)?;
            }
            let folder = VaultFolder::new(name, parent_id);
            let id = folder.id;
            session.folders.push(folder);
            Ok(id)
        })
    }

    pub fn rename_folder(&mut self, id: Uuid, name: &str) -> Result<()> {
        let name = validate_folder_name(name)?;
        self.mutate(|session| {
            session.folder_mut(id)?.name = name;
            Ok(())
        })
    }

    /// Re-parent a folder; `None` moves it to the top level.
    pub fn move_folder(&mut self, id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        self.mutate(|session| {
            session.require_folder(id)?;
            if let Some(parent) = new_parent {
                session.require_folder(parent)?;
                if folder::is_descendant_or_self(&session.folders, parent, id) {
                    return Err(VaultError::FolderCycle(id, parent).into());
                }
            }
            session.folder_mut(id)?.parent_id = new_parent;
            Ok(())
        })
    }

    /// Remove a folder.  Its entries become unfiled and its child
    /// folders move up to its parent.
    pub fn delete_folder(&mut self, id: Uuid) -> Result<()> {
        self.mutate(|session| {
            let parent = session.folder_mut(id)?.parent_id;
            session.folders.retain(|f| f.id != id);
            for child in session.folders.iter_mut().filter(|f| f.parent_id == Some(id)) {
                child.parent_id = parent;
            }
            let now = Utc::now();
            for entry in session.entries.iter_mut().filter(|e| e.folder_id == Some(id)) {
                entry.folder_id = None;
                entry.touch(now);
            }
            Ok(())
        })
    }

    /// Slash-separated path from the top level, e.g. `Work / Servers`.
    pub fn folder_path(&self, id: Uuid) -> Result<String> {
        let session = self.session()?;
        session.require_folder(id)?;
        Ok(folder::path_names(&session.folders, id).join(" / "))
    }

    pub fn folders(&self) -> Result<&[VaultFolder]> {
        Ok(&self.session()?.folders)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Borrowed view of every entry, trashed ones included.
    pub fn entries(&self) -> Result<&[VaultEntry]> {
        Ok(&self.session()?.entries)
    }

    pub fn get_entry(&self, id: Uuid) -> Result<VaultEntry> {
        self.session()?
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| VaultError::EntryNotFound(id).into())
    }

    /// Copies of the live entries.
    pub fn get_entries(&self) -> Result<Vec<VaultEntry>> {
        Ok(self.entries()?.iter().filter(|e| !e.deleted).cloned().collect())
    }

    /// Copies of the trashed entries.
    pub fn get_deleted_entries(&self) -> Result<Vec<VaultEntry>> {
        Ok(self.entries()?.iter().filter(|e| e.deleted).cloned().collect())
    }

    pub fn search(&self, filter: &VaultFilter) -> Result<Vec<&VaultEntry>> {
        Ok(search::search(self.entries()?, filter))
    }

    pub fn statistics(&self) -> Result<VaultStatistics> {
        let session = self.session()?;
        Ok(compute_statistics(&session.entries, &session.folders, Utc::now()))
    }

    pub fn security_report(&self) -> Result<SecurityReport> {
        Ok(generate_security_report(self.entries()?))
    }

    /// Current TOTP code for a login, computed by `provider`.
    pub fn totp_code(&self, id: Uuid, provider: &dyn TotpProvider) -> Result<String> {
        let entry = self
            .session()?
            .entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(VaultError::EntryNotFound(id))?;
        let login = entry.as_login().ok_or_else(|| {
            VaultError::TypeMismatch(
                id,
                kind_label(entry.entry_type()),
                "only logins have TOTP secrets".into(),
            )
        })?;
        let secret = login
            .totp_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CredVaultError::Totp(format!("entry '{}' has no TOTP secret", entry.name)))?;
        totp::code_for(provider, secret)
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    /// Interchange JSON; trashed entries only when `include_deleted`.
    pub fn export_json(&self, include_deleted: bool) -> Result<String> {
        let session = self.session()?;
        let entries = session
            .entries
            .iter()
            .filter(|e| include_deleted || !e.deleted);
        interchange::render_interchange(entries, &session.folders)
    }

    /// `export_json` sealed with a password-based envelope.
    pub fn export_encrypted(&self, password: &str, include_deleted: bool) -> Result<Vec<u8>> {
        let mut json = self.export_json(include_deleted)?;
        let sealed = encrypt(json.as_bytes(), password.as_bytes());
        json.zeroize();
        sealed
    }

    /// Merge interchange JSON into the vault.
    ///
    /// Bad records are skipped and reported.  An imported id that already
    /// exists gets a fresh one, and references to folders that do not
    /// exist after the merge are cleared.
    pub fn import_json(&mut self, json: &str) -> Result<ImportReport> {
        self.session()?;
        let parsed = interchange::parse_interchange(json)?;

        self.mutate(|session| {
            let mut report = ImportReport {
                skipped: parsed.skipped,
                ..ImportReport::default()
            };

            let mut taken: HashSet<Uuid> = session.folders.iter().map(|f| f.id).collect();
            let mut remap: HashMap<Uuid, Uuid> = HashMap::new();
            let first_new = session.folders.len();
            for mut folder in parsed.folders {
                if !taken.insert(folder.id) {
                    let fresh = Uuid::new_v4();
                    remap.insert(folder.id, fresh);
                    folder.id = fresh;
                    taken.insert(fresh);
                }
                session.folders.push(folder);
                report.folders_imported += 1;
            }

            // Resolve parents only after every imported folder is known,
            // then break any link that would close a cycle.
            for i in first_new..session.folders.len() {
                let parent = session.folders[i]
                    .parent_id
                    .map(|p| remap.get(&p).copied().unwrap_or(p))
                    .filter(|p| taken.contains(p));
                let id = session.folders[i].id;
                session.folders[i].parent_id = None;
                if let Some(p) = parent {
                    if !folder::is_descendant_or_self(&session.folders, p, id) {
                        session.folders[i].parent_id = Some(p);
                    }
                }
            }

            let mut entry_ids: HashSet<Uuid> = session.entries.iter().map(|e| e.id).collect();
            for mut entry in parsed.entries {
                if !entry_ids.insert(entry.id) {
                    entry.id = Uuid::new_v4();
                    entry_ids.insert(entry.id);
                }
                entry.folder_id = entry
                    .folder_id
                    .map(|f| remap.get(&f).copied().unwrap_or(f))
                    .filter(|f| taken.contains(f));
                session.entries.push(entry);
                report.imported += 1;
            }

            info!(
                imported = report.imported,
                folders = report.folders_imported,
                skipped = report.skipped.len(),
                "import finished"
            );
            Ok(report)
        })
    }

    /// Reverse of `export_encrypted`.
    pub fn import_encrypted(&mut self, blob: &[u8], password: &str) -> Result<ImportReport> {
        self.session()?;
        let plaintext = decrypt(blob, password.as_bytes())?;
        let json = std::str::from_utf8(&plaintext).map_err(|_| {
            crate::errors::SchemaError::MalformedDocument("decrypted export is not UTF-8".into())
        })?;
        self.import_json(json)
    }
}

fn validate_folder_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VaultError::InvalidEntry("folder name cannot be empty".into()).into());
    }
    Ok(name.to_string())
}
