//! Integration tests for the CredVault vault store.

use std::fs;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use credvault::config::VaultSettings;
use credvault::crypto::kdf::MIN_ITERATIONS;
use credvault::errors::{AuthError, CredVaultError, Result, StorageError, VaultError};
use credvault::totp::{OtpAuthFields, TotpAlgorithm, TotpProvider};
use credvault::vault::{LockState, VaultEntry, VaultPaths, VaultStore};
use tempfile::TempDir;

const PASSWORD: &str = "correct horse battery";

/// Helper: a vault path inside a fresh temp dir.
fn vault_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.cvault");
    (dir, path)
}

fn fast_settings() -> VaultSettings {
    VaultSettings {
        kdf_iterations: MIN_ITERATIONS,
        ..VaultSettings::default()
    }
}

/// Helper: an initialized, unlocked store.
fn new_store() -> (TempDir, VaultStore) {
    let (dir, path) = vault_path();
    let mut store = VaultStore::with_settings(path, fast_settings());
    store.initialize(PASSWORD).expect("initialize");
    (dir, store)
}

fn reopen(store: &VaultStore) -> VaultStore {
    VaultStore::with_settings(store.path(), fast_settings())
}

// ---------------------------------------------------------------------------
// Lock state machine
// ---------------------------------------------------------------------------

#[test]
fn initialize_writes_every_artifact() {
    let (_dir, store) = new_store();
    let paths = VaultPaths::new(store.path());

    assert!(store.is_unlocked());
    assert!(paths.main.exists());
    assert!(paths.salt.exists());
    assert!(paths.hash.exists());
    assert!(paths.settings.exists());
}

#[test]
fn initialize_twice_fails() {
    let (_dir, mut store) = new_store();
    store.lock().unwrap();

    let err = store.initialize(PASSWORD).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Vault(VaultError::AlreadyInitialized(_))
    ));
}

#[test]
fn lock_unlock_roundtrip_preserves_entries() {
    let (_dir, mut store) = new_store();
    let login = VaultEntry::login("GitHub", "octocat", "s3cret!")
        .with_tags(["dev", "work"])
        .with_favorite(true);
    let note = VaultEntry::secure_note("Wifi", "hunter2");
    let card = VaultEntry::card("Visa", "A. Holder", "4111 1111 1111 1111");
    let expected = vec![login.clone(), note.clone(), card.clone()];

    store.add_entry(login).unwrap();
    store.add_entry(note).unwrap();
    store.add_entry(card).unwrap();
    store.lock().unwrap();
    assert_eq!(store.state(), LockState::Locked);

    store.unlock(PASSWORD).unwrap();
    assert_eq!(store.entries().unwrap(), expected.as_slice());
}

#[test]
fn a_second_handle_sees_persisted_changes() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Mail", "me", "pw")).unwrap();

    let mut other = reopen(&store);
    other.unlock(PASSWORD).unwrap();
    assert_eq!(other.get_entry(id).unwrap().name, "Mail");
}

#[test]
fn wrong_password_keeps_vault_locked() {
    let (_dir, mut store) = new_store();
    store.lock().unwrap();

    let err = store.unlock("not the password").unwrap_err();
    assert!(matches!(err, CredVaultError::Auth(AuthError::InvalidPassword)));
    assert_eq!(store.state(), LockState::Locked);
    assert!(matches!(
        store.entries().unwrap_err(),
        CredVaultError::Vault(VaultError::Locked)
    ));
}

#[test]
fn unlock_missing_vault_is_not_initialized() {
    let (_dir, path) = vault_path();
    let mut store = VaultStore::with_settings(path, fast_settings());
    assert!(!store.is_initialized().unwrap());

    let err = store.unlock(PASSWORD).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Vault(VaultError::NotInitialized(_))
    ));
}

#[test]
fn unlock_twice_fails() {
    let (_dir, mut store) = new_store();
    let err = store.unlock(PASSWORD).unwrap_err();
    assert!(matches!(err, CredVaultError::Vault(VaultError::AlreadyUnlocked)));
}

#[test]
fn locked_store_rejects_every_operation() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("A", "a", "pw")).unwrap();
    let snapshot = store.get_entry(id).unwrap();
    store.lock().unwrap();

    let locked = |r: Result<()>| matches!(r, Err(CredVaultError::Vault(VaultError::Locked)));
    assert!(locked(store.add_entry(VaultEntry::secure_note("N", "x")).map(|_| ())));
    assert!(locked(store.update_entry(snapshot)));
    assert!(locked(store.delete_entry(id)));
    assert!(locked(store.restore_entry(id)));
    assert!(locked(store.permanently_delete_entry(id)));
    assert!(locked(store.add_folder("Work", None).map(|_| ())));
    assert!(locked(store.change_master_password(PASSWORD, "another password")));
    assert!(locked(store.empty_trash().map(|_| ())));
    assert!(locked(store.get_entry(id).map(|_| ())));
    assert!(locked(store.export_json(false).map(|_| ())));
    assert!(locked(store.lock()));

    store.unlock(PASSWORD).unwrap();
    assert_eq!(store.get_entries().unwrap().len(), 1);
    assert!(store.folders().unwrap().is_empty());
}

#[test]
fn missing_sidecar_is_an_inconsistent_state() {
    let (_dir, mut store) = new_store();
    store.lock().unwrap();
    fs::remove_file(VaultPaths::new(store.path()).salt).unwrap();

    let err = store.unlock(PASSWORD).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Storage(StorageError::InconsistentState(_))
    ));
}

#[test]
fn change_master_password_rekeys_the_vault() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Bank", "me", "pw")).unwrap();
    let old_salt = fs::read(VaultPaths::new(store.path()).salt).unwrap();

    store.change_master_password(PASSWORD, "a brand new password").unwrap();
    store.lock().unwrap();

    let new_salt = fs::read(VaultPaths::new(store.path()).salt).unwrap();
    assert_ne!(old_salt, new_salt);
    assert!(store.unlock(PASSWORD).is_err());
    store.unlock("a brand new password").unwrap();
    assert_eq!(store.get_entry(id).unwrap().name, "Bank");
}

#[test]
fn change_master_password_requires_the_old_one() {
    let (_dir, mut store) = new_store();
    let err = store
        .change_master_password("wrong", "a brand new password")
        .unwrap_err();
    assert!(matches!(err, CredVaultError::Auth(AuthError::InvalidPassword)));

    store.lock().unwrap();
    store.unlock(PASSWORD).unwrap();
}

#[test]
fn auto_lock_is_due_after_idle_timeout() {
    let (_dir, store) = new_store();
    let now = store.last_activity();
    assert!(!store.auto_lock_due(now + Duration::seconds(10)));
    assert!(store.auto_lock_due(now + Duration::seconds(301)));
}

// ---------------------------------------------------------------------------
// Failed saves
// ---------------------------------------------------------------------------

/// Occupy the temp path a write to `target` stages through, so the write
/// fails.  Returns the blocker so the test can remove it again.
fn block_temp_file(target: &std::path::Path) -> PathBuf {
    let name = target.file_name().unwrap().to_string_lossy();
    let blocker = target.with_file_name(format!(".{name}.tmp"));
    fs::create_dir(&blocker).unwrap();
    blocker
}

fn is_write_failure(err: &CredVaultError) -> bool {
    matches!(err, CredVaultError::Storage(StorageError::WriteFailed { .. }))
}

#[test]
fn failed_persist_leaves_nothing_applied() {
    let (_dir, mut store) = new_store();
    let entry = VaultEntry::login("Mail", "me", "pw");
    let blocker = block_temp_file(store.path());

    let err = store.add_entry(entry.clone()).unwrap_err();
    assert!(is_write_failure(&err));
    assert!(store.get_entries().unwrap().is_empty());

    fs::remove_dir(&blocker).unwrap();
    let id = store.add_entry(entry).unwrap();

    let mut other = reopen(&store);
    other.unlock(PASSWORD).unwrap();
    assert_eq!(other.get_entry(id).unwrap().name, "Mail");
}

#[test]
fn failed_persist_keeps_memory_matching_disk() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::secure_note("Keep", "x")).unwrap();
    let blocker = block_temp_file(store.path());

    assert!(store.delete_entry(id).is_err());
    assert!(store.get_deleted_entries().unwrap().is_empty());
    fs::remove_dir(&blocker).unwrap();

    store.lock().unwrap();
    store.unlock(PASSWORD).unwrap();
    assert!(!store.get_entry(id).unwrap().deleted);
}

#[test]
fn failed_rekey_keeps_the_old_password() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Bank", "me", "pw")).unwrap();
    let blocker = block_temp_file(&VaultPaths::new(store.path()).hash);

    let err = store
        .change_master_password(PASSWORD, "a brand new password")
        .unwrap_err();
    assert!(is_write_failure(&err));
    fs::remove_dir(&blocker).unwrap();

    store.lock().unwrap();
    assert!(matches!(
        store.unlock("a brand new password").unwrap_err(),
        CredVaultError::Auth(AuthError::InvalidPassword)
    ));
    store.unlock(PASSWORD).unwrap();
    assert_eq!(store.get_entry(id).unwrap().name, "Bank");
}

#[test]
fn failed_initialize_can_be_retried() {
    let (_dir, path) = vault_path();
    let mut store = VaultStore::with_settings(&path, fast_settings());
    let blocker = block_temp_file(&VaultPaths::new(&path).hash);

    assert!(store.initialize(PASSWORD).is_err());
    assert!(!store.is_unlocked());
    assert!(!store.is_initialized().unwrap());

    fs::remove_dir(&blocker).unwrap();
    store.initialize(PASSWORD).unwrap();
    store.lock().unwrap();
    store.unlock(PASSWORD).unwrap();
}

// ---------------------------------------------------------------------------
// Entry lifecycle
// ---------------------------------------------------------------------------

#[test]
fn soft_delete_and_restore() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Old", "a", "pw")).unwrap();

    store.delete_entry(id).unwrap();
    assert!(store.get_entries().unwrap().is_empty());
    let trashed = store.get_deleted_entries().unwrap();
    assert_eq!(trashed.len(), 1);
    assert!(trashed[0].deleted_at.is_some());

    store.restore_entry(id).unwrap();
    let entry = store.get_entry(id).unwrap();
    assert!(!entry.deleted);
    assert!(entry.deleted_at.is_none());
}

#[test]
fn restoring_a_live_entry_fails() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Live", "a", "pw")).unwrap();
    let err = store.restore_entry(id).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Vault(VaultError::EntryNotDeleted(_))
    ));
}

#[test]
fn cleanup_respects_retention_window() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Gone", "a", "pw")).unwrap();
    store.delete_entry(id).unwrap();

    let now = Utc::now();
    assert_eq!(store.cleanup_deleted_as_of(30, now + Duration::days(10)).unwrap(), 0);
    assert_eq!(store.get_deleted_entries().unwrap().len(), 1);

    assert_eq!(store.cleanup_deleted_as_of(30, now + Duration::days(31)).unwrap(), 1);
    assert!(matches!(
        store.get_entry(id).unwrap_err(),
        CredVaultError::Vault(VaultError::EntryNotFound(_))
    ));
}

#[test]
fn empty_trash_erases_only_trashed_entries() {
    let (_dir, mut store) = new_store();
    let keep = store.add_entry(VaultEntry::login("Keep", "a", "pw")).unwrap();
    let drop = store.add_entry(VaultEntry::login("Drop", "b", "pw")).unwrap();
    store.delete_entry(drop).unwrap();

    assert_eq!(store.empty_trash().unwrap(), 1);
    assert!(store.get_entry(keep).is_ok());
    assert!(store.get_entry(drop).is_err());
}

#[test]
fn purging_the_trash_counts_as_activity() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Old", "a", "pw")).unwrap();
    store.delete_entry(id).unwrap();

    let before = store.last_activity();
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(store.empty_trash().unwrap(), 1);
    assert!(store.last_activity() > before);
}

#[test]
fn update_entry_records_password_history() {
    let (_dir, mut store) = new_store();
    let entry = VaultEntry::login("Site", "me", "first");
    let id = store.add_entry(entry.clone()).unwrap();

    let mut edited = store.get_entry(id).unwrap();
    edited.as_login_mut().unwrap().password = "second".into();
    store.update_entry(edited).unwrap();

    let stored = store.get_entry(id).unwrap();
    let login = stored.as_login().unwrap();
    assert_eq!(login.password, "second");
    assert_eq!(login.password_history.len(), 1);
    assert_eq!(login.password_history[0].password, "first");
    assert_eq!(stored.created_at, entry.created_at);
}

#[test]
fn update_entry_cannot_change_kind() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Site", "me", "pw")).unwrap();

    let mut note = VaultEntry::secure_note("Site", "text");
    note.id = id;
    let err = store.update_entry(note).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Vault(VaultError::TypeMismatch(..))
    ));
}

#[test]
fn duplicate_ids_are_rejected() {
    let (_dir, mut store) = new_store();
    let entry = VaultEntry::login("Once", "a", "pw");
    store.add_entry(entry.clone()).unwrap();
    let err = store.add_entry(entry).unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Vault(VaultError::DuplicateEntry(_))
    ));
}

#[test]
fn change_entry_password_keeps_five_previous() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Rotating", "a", "pw0")).unwrap();
    for i in 1..=7 {
        store.change_entry_password(id, &format!("pw{i}")).unwrap();
    }

    let entry = store.get_entry(id).unwrap();
    let history: Vec<&str> = entry
        .as_login()
        .unwrap()
        .password_history
        .iter()
        .map(|h| h.password.as_str())
        .collect();
    assert_eq!(history, vec!["pw2", "pw3", "pw4", "pw5", "pw6"]);
    assert_eq!(entry.password(), Some("pw7"));
}

// ---------------------------------------------------------------------------
// Folders
// ---------------------------------------------------------------------------

#[test]
fn folder_tree_paths_and_cycles() {
    let (_dir, mut store) = new_store();
    let work = store.add_folder("Work", None).unwrap();
    let servers = store.add_folder("Servers", Some(work)).unwrap();
    assert_eq!(store.folder_path(servers).unwrap(), "Work / Servers");

    let err = store.move_folder(work, Some(servers)).unwrap_err();
    assert!(matches!(err, CredVaultError::Vault(VaultError::FolderCycle(..))));

    store.rename_folder(work, "Job").unwrap();
    assert_eq!(store.folder_path(servers).unwrap(), "Job / Servers");
}

#[test]
fn deleting_a_folder_unfiles_entries_and_lifts_children() {
    let (_dir, mut store) = new_store();
    let work = store.add_folder("Work", None).unwrap();
    let servers = store.add_folder("Servers", Some(work)).unwrap();
    let id = store
        .add_entry(VaultEntry::login("VPN", "a", "pw").with_folder(work))
        .unwrap();

    store.delete_folder(work).unwrap();
    assert_eq!(store.get_entry(id).unwrap().folder_id, None);
    assert_eq!(store.folder_path(servers).unwrap(), "Servers");
}

#[test]
fn entries_must_reference_existing_folders() {
    let (_dir, mut store) = new_store();
    let err = store
        .add_entry(VaultEntry::login("Lost", "a", "pw").with_folder(uuid::Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(
        err,
        CredVaultError::Vault(VaultError::FolderNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[test]
fn export_import_between_vaults() {
    let (_dir, mut source) = new_store();
    let work = source.add_folder("Work", None).unwrap();
    source
        .add_entry(VaultEntry::login("Jira", "me", "pw").with_folder(work))
        .unwrap();
    let gone = source.add_entry(VaultEntry::secure_note("Old", "x")).unwrap();
    source.delete_entry(gone).unwrap();

    let json = source.export_json(false).unwrap();

    let (_dir2, mut target) = new_store();
    let report = target.import_json(&json).unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.folders_imported, 1);
    assert!(report.skipped.is_empty());

    let imported = &target.get_entries().unwrap()[0];
    assert_eq!(imported.name, "Jira");
    let folder = imported.folder_id.expect("folder kept");
    assert_eq!(target.folder_path(folder).unwrap(), "Work");
}

#[test]
fn importing_into_the_same_vault_assigns_fresh_ids() {
    let (_dir, mut store) = new_store();
    let id = store.add_entry(VaultEntry::login("Twin", "a", "pw")).unwrap();
    let json = store.export_json(false).unwrap();

    store.import_json(&json).unwrap();
    let entries = store.get_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0].id, entries[1].id);
    assert!(entries.iter().any(|e| e.id == id));
}

#[test]
fn encrypted_export_needs_its_password() {
    let (_dir, mut source) = new_store();
    source.add_entry(VaultEntry::login("Sealed", "a", "pw")).unwrap();
    let blob = source.export_encrypted("export password", false).unwrap();

    let (_dir2, mut target) = new_store();
    assert!(target.import_encrypted(&blob, "wrong password").is_err());
    let report = target.import_encrypted(&blob, "export password").unwrap();
    assert_eq!(report.imported, 1);
}

// ---------------------------------------------------------------------------
// TOTP collaborator
// ---------------------------------------------------------------------------

/// Produces a code from the secret length so tests can assert on it.
struct FixedProvider;

impl TotpProvider for FixedProvider {
    fn generate_code(
        &self,
        secret: &str,
        _algorithm: TotpAlgorithm,
        digits: u32,
        _period: u64,
    ) -> Result<String> {
        Ok(format!("{:0width$}", secret.len(), width = digits as usize))
    }

    fn parse_otpauth_url(&self, _url: &str) -> Result<OtpAuthFields> {
        Ok(OtpAuthFields {
            digits: 8,
            ..OtpAuthFields::from_secret("ABCDEFGH")
        })
    }

    fn build_otpauth_url(&self, fields: &OtpAuthFields) -> Result<String> {
        Ok(format!("otpauth://totp/x?secret={}", fields.secret))
    }
}

#[test]
fn totp_codes_come_from_the_provider() {
    let (_dir, mut store) = new_store();
    let mut entry = VaultEntry::login("2FA", "a", "pw");
    entry.as_login_mut().unwrap().totp_secret = Some("JBSWY3DP".into());
    let bare = store.add_entry(entry).unwrap();

    let mut entry = VaultEntry::login("URL", "a", "pw");
    entry.as_login_mut().unwrap().totp_secret = Some("otpauth://totp/x?secret=ABCDEFGH".into());
    let url = store.add_entry(entry).unwrap();

    let none = store.add_entry(VaultEntry::login("Plain", "a", "pw")).unwrap();

    assert_eq!(store.totp_code(bare, &FixedProvider).unwrap(), "000008");
    assert_eq!(store.totp_code(url, &FixedProvider).unwrap(), "00000008");
    assert!(matches!(
        store.totp_code(none, &FixedProvider).unwrap_err(),
        CredVaultError::Totp(_)
    ));
}
