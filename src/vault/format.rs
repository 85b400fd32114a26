//! On-disk layout of a vault and atomic file I/O.
//!
//! For a main vault path `P` (e.g. `vault.cvault`) the artifacts are:
//!
//! ```text
//! P              [salt: 32][nonce: 12][AES-256-GCM(document JSON) + tag: 16]
//! P.salt         raw KDF salt (must equal the envelope salt)
//! P.hash         {"algorithm":"pbkdf2-sha256","iterations":N,"verifier":"<base64>"}
//! P.toml         VaultSettings
//! P.bak          previous main file, copied before every replacement
//! ```
//!
//! The main file, salt and hash must exist together.  Any partial set is
//! reported as `StorageError::InconsistentState` rather than guessed at.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use zeroize::Zeroizing;

use super::entry::VaultEntry;
use super::folder::VaultFolder;
use crate::crypto::kdf::MIN_SALT_LEN;
use crate::errors::{Result, SchemaError, StorageError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current version of the decrypted document schema.
pub const DOCUMENT_VERSION: u32 = 1;

/// Identifier written into the verifier record.
pub const VERIFIER_ALGORITHM: &str = "pbkdf2-sha256";

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Every file that belongs to one vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    pub main: PathBuf,
    pub salt: PathBuf,
    pub hash: PathBuf,
    pub settings: PathBuf,
    pub backup: PathBuf,
}

impl VaultPaths {
    pub fn new(main: impl Into<PathBuf>) -> Self {
        let main = main.into();
        let mut backup = main.clone().into_os_string();
        backup.push(".bak");
        Self {
            salt: main.with_extension("salt"),
            hash: main.with_extension("hash"),
            settings: main.with_extension("toml"),
            backup: PathBuf::from(backup),
            main,
        }
    }

    /// Directory holding the vault (created on first write).
    pub fn dir(&self) -> &Path {
        match self.main.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// What is on disk for a vault path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskState {
    /// Nothing yet; `initialize` may proceed.
    Absent,
    /// Main file, salt and verifier are all present.
    Complete,
}

/// Classify the on-disk artifacts, rejecting partial sets.
pub fn inspect(paths: &VaultPaths) -> Result<DiskState> {
    let present = [
        ("vault file", paths.main.exists()),
        ("salt sidecar", paths.salt.exists()),
        ("verifier sidecar", paths.hash.exists()),
    ];

    if present.iter().all(|(_, exists)| *exists) {
        return Ok(DiskState::Complete);
    }
    if present.iter().all(|(_, exists)| !*exists) {
        return Ok(DiskState::Absent);
    }

    let missing: Vec<&str> = present
        .iter()
        .filter(|(_, exists)| !*exists)
        .map(|(name, _)| *name)
        .collect();
    Err(StorageError::InconsistentState(format!(
        "{} is missing next to {}",
        missing.join(" and "),
        paths.main.display()
    ))
    .into())
}

// ---------------------------------------------------------------------------
// Atomic writes
// ---------------------------------------------------------------------------

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn write_failed(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::WriteFailed {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` to `.<name>.tmp` next to `path`, synced and owner-only.
/// Returns the temp path; the target itself is not touched.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => Ok(tmp_path),
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(write_failed(path, e).into())
        }
    }
}

/// Write `bytes` to `path` atomically with owner-only permissions.
///
/// The data goes to `.<name>.tmp` in the same directory, is synced, and
/// is then renamed over the target.  On failure the temp file is removed
/// and the previous target is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = stage(path, bytes)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_failed(path, e).into());
    }
    Ok(())
}

/// Replace the main file, salt and verifier together.
///
/// All three are staged first, so a failed write leaves the old set in
/// place.  If a rename fails midway, the files already swapped are put
/// back from their previous contents (or removed if they did not exist),
/// so the set on disk is never a mix of old and new.
pub fn write_vault_set(
    paths: &VaultPaths,
    envelope: &[u8],
    salt: &[u8],
    record: &VerifierRecord,
) -> Result<()> {
    let verifier = encode_verifier(record)?;
    let targets: [(&Path, &[u8]); 3] = [
        (paths.main.as_path(), envelope),
        (paths.salt.as_path(), salt),
        (paths.hash.as_path(), verifier.as_slice()),
    ];

    let mut previous: Vec<Option<Vec<u8>>> = Vec::with_capacity(targets.len());
    for (path, _) in &targets {
        previous.push(if path.is_file() {
            Some(read_file(path)?)
        } else {
            None
        });
    }

    let mut staged: Vec<PathBuf> = Vec::with_capacity(targets.len());
    for (path, bytes) in &targets {
        match stage(path, bytes) {
            Ok(tmp) => staged.push(tmp),
            Err(e) => {
                discard(&staged);
                return Err(e);
            }
        }
    }

    if let Some(old_main) = &previous[0] {
        if let Err(e) = fs::write(&paths.backup, old_main) {
            discard(&staged);
            return Err(write_failed(&paths.backup, e).into());
        }
    }

    for (i, ((path, _), tmp)) in targets.iter().zip(&staged).enumerate() {
        if let Err(e) = fs::rename(tmp, path) {
            discard(&staged[i..]);
            for ((done, _), old) in targets[..i].iter().zip(&previous) {
                roll_back(done, old.as_deref());
            }
            return Err(write_failed(path, e).into());
        }
    }
    Ok(())
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        let _ = fs::remove_file(tmp);
    }
}

fn roll_back(path: &Path, previous: Option<&[u8]>) {
    let restored: Result<()> = match previous {
        Some(bytes) => write_atomic(path, bytes),
        None => fs::remove_file(path).map_err(|e| write_failed(path, e).into()),
    };
    if let Err(e) = restored {
        warn!(path = %path.display(), error = %e, "could not roll back vault file");
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| {
        StorageError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Replace the main vault file, keeping the previous one as `.bak`.
pub fn write_main(paths: &VaultPaths, envelope: &[u8]) -> Result<()> {
    if paths.main.exists() {
        fs::copy(&paths.main, &paths.backup).map_err(|e| write_failed(&paths.backup, e))?;
    }
    write_atomic(&paths.main, envelope)
}

pub fn read_main(paths: &VaultPaths) -> Result<Vec<u8>> {
    read_file(&paths.main)
}

// ---------------------------------------------------------------------------
// Sidecars
// ---------------------------------------------------------------------------

pub fn write_salt(paths: &VaultPaths, salt: &[u8]) -> Result<()> {
    write_atomic(&paths.salt, salt)
}

pub fn read_salt(paths: &VaultPaths) -> Result<Vec<u8>> {
    let salt = read_file(&paths.salt)?;
    if salt.len() < MIN_SALT_LEN {
        return Err(StorageError::InconsistentState(format!(
            "salt sidecar holds {} bytes, expected at least {MIN_SALT_LEN}",
            salt.len()
        ))
        .into());
    }
    Ok(salt)
}

/// Contents of the `.hash` sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierRecord {
    pub algorithm: String,
    pub iterations: u32,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub verifier: Vec<u8>,
}

impl VerifierRecord {
    pub fn new(iterations: u32, verifier: &[u8]) -> Self {
        Self {
            algorithm: VERIFIER_ALGORITHM.to_string(),
            iterations,
            verifier: verifier.to_vec(),
        }
    }
}

fn encode_verifier(record: &VerifierRecord) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(record)
        .map_err(|e| SchemaError::MalformedDocument(format!("verifier record: {e}")).into())
}

pub fn write_verifier(paths: &VaultPaths, record: &VerifierRecord) -> Result<()> {
    write_atomic(&paths.hash, &encode_verifier(record)?)
}

pub fn read_verifier(paths: &VaultPaths) -> Result<VerifierRecord> {
    let bytes = read_file(&paths.hash)?;
    let record: VerifierRecord = serde_json::from_slice(&bytes)
        .map_err(|e| SchemaError::MalformedDocument(format!("verifier record: {e}")))?;
    if record.algorithm != VERIFIER_ALGORITHM {
        return Err(SchemaError::MalformedDocument(format!(
            "unsupported verifier algorithm '{}'",
            record.algorithm
        ))
        .into());
    }
    Ok(record)
}

// ---------------------------------------------------------------------------
// Decrypted document
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    version: u32,
    created_at: DateTime<Utc>,
    items: &'a [VaultEntry],
    folders: &'a [VaultFolder],
}

/// The decrypted vault document, with items still as raw JSON so each one
/// can go through the validated entry loader.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDocument {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub folders: Vec<VaultFolder>,
}

/// Serialize the collection into the plaintext that gets encrypted.
pub fn encode_document(
    created_at: DateTime<Utc>,
    entries: &[VaultEntry],
    folders: &[VaultFolder],
) -> Result<Zeroizing<Vec<u8>>> {
    let document = DocumentRef {
        version: DOCUMENT_VERSION,
        created_at,
        items: entries,
        folders,
    };
    serde_json::to_vec(&document)
        .map(Zeroizing::new)
        .map_err(|e| SchemaError::MalformedDocument(format!("vault document: {e}")).into())
}

pub fn decode_document(plaintext: &[u8]) -> Result<VaultDocument> {
    let document: VaultDocument = serde_json::from_slice(plaintext)
        .map_err(|e| SchemaError::MalformedDocument(format!("vault document: {e}")))?;
    if document.version > DOCUMENT_VERSION {
        return Err(SchemaError::UnsupportedVersion {
            found: document.version,
            supported: DOCUMENT_VERSION,
        }
        .into());
    }
    Ok(document)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
