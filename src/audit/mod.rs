//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every vault operation (init, add, delete, export, …)
//! in a local SQLite database at `<vault_dir>/audit.db`.  Only ids and
//! operation names are recorded, never secret values.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.  Builds
//! without the `audit-log` feature keep `log_audit` as a no-op.

#[cfg(feature = "audit-log")]
use std::path::{Path, PathBuf};

#[cfg(feature = "audit-log")]
use chrono::{DateTime, Utc};
#[cfg(feature = "audit-log")]
use rusqlite::Connection;
use uuid::Uuid;

use crate::cli::Cli;
#[cfg(feature = "audit-log")]
use crate::errors::{CredVaultError, Result};

/// Every operation the CLI records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    Add,
    Edit,
    Copy,
    Delete,
    Erase,
    Restore,
    Cleanup,
    EmptyTrash,
    ChangePassword,
    Import,
    Export,
    FolderAdd,
    FolderRename,
    FolderMove,
    FolderDelete,
}

impl Operation {
    pub const ALL: [Operation; 16] = [
        Operation::Init,
        Operation::Add,
        Operation::Edit,
        Operation::Copy,
        Operation::Delete,
        Operation::Erase,
        Operation::Restore,
        Operation::Cleanup,
        Operation::EmptyTrash,
        Operation::ChangePassword,
        Operation::Import,
        Operation::Export,
        Operation::FolderAdd,
        Operation::FolderRename,
        Operation::FolderMove,
        Operation::FolderDelete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Add => "add",
            Operation::Edit => "edit",
            Operation::Copy => "copy",
            Operation::Delete => "delete",
            Operation::Erase => "erase",
            Operation::Restore => "restore",
            Operation::Cleanup => "cleanup",
            Operation::EmptyTrash => "empty-trash",
            Operation::ChangePassword => "change-password",
            Operation::Import => "import",
            Operation::Export => "export",
            Operation::FolderAdd => "folder-add",
            Operation::FolderRename => "folder-rename",
            Operation::FolderMove => "folder-move",
            Operation::FolderDelete => "folder-delete",
        }
    }

    /// Whether the operation removes or overwrites data.
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            Operation::Delete
                | Operation::Erase
                | Operation::Cleanup
                | Operation::EmptyTrash
                | Operation::FolderDelete
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
                format!("unknown operation '{s}' (known: {})", known.join(", "))
            })
    }
}

/// Filters for [`AuditLog::query`].
#[cfg(feature = "audit-log")]
#[derive(Debug, Clone)]
pub struct AuditQuery {
    /// Maximum number of rows, most recent first.
    pub limit: usize,
    pub since: Option<DateTime<Utc>>,
    /// Vault file name; `None` covers every vault sharing the directory.
    pub vault: Option<String>,
    pub operation: Option<Operation>,
    /// Start of an entry id, case-insensitive.
    pub entry_prefix: Option<String>,
}

#[cfg(feature = "audit-log")]
impl AuditQuery {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            since: None,
            vault: None,
            operation: None,
            entry_prefix: None,
        }
    }
}

/// A single audit log entry.
#[cfg(feature = "audit-log")]
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    /// File name of the vault the operation ran against.
    pub vault: String,
    pub entry_id: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
#[cfg(feature = "audit-log")]
pub struct AuditLog {
    conn: Connection,
}

#[cfg(feature = "audit-log")]
impl AuditLog {
    /// Open (or create) the audit database at `<vault_dir>/audit.db`.
    ///
    /// Returns `None` if the database can't be opened: callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(vault_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(vault_dir);
        let conn = Connection::open(&db_path).ok()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                vault       TEXT NOT NULL,
                entry_id    TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation. Fire-and-forget: errors are silently ignored.
    pub fn log(&self, operation: Operation, vault: &str, entry_id: Option<Uuid>, details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let operation = operation.as_str();
        let entry_id = entry_id.map(|id| id.to_string());
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, vault, entry_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, vault, entry_id, details],
        );
    }

    /// Entries matching `filter`, most recent first.
    pub fn query(&self, filter: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
        let since = filter.since.map(|ts| ts.to_rfc3339());
        let entry_prefix = filter
            .entry_prefix
            .as_deref()
            .map(|p| format!("{}%", p.to_ascii_lowercase()));

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, vault, entry_id, details
                 FROM audit_log
                 WHERE (?1 IS NULL OR timestamp >= ?1)
                   AND (?2 IS NULL OR vault = ?2)
                   AND (?3 IS NULL OR operation = ?3)
                   AND (?4 IS NULL OR entry_id LIKE ?4)
                 ORDER BY id DESC
                 LIMIT ?5",
            )
            .map_err(|e| CredVaultError::Audit(format!("query prepare: {e}")))?;

        let operation = filter.operation.map(Operation::as_str);
        let rows = stmt
            .query_map(
                rusqlite::params![since, filter.vault, operation, entry_prefix, limit],
                |row| {
                    let ts_str: String = row.get(1)?;
                    let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                    Ok(AuditEntry {
                        id: row.get(0)?,
                        timestamp,
                        operation: row.get(2)?,
                        vault: row.get(3)?,
                        entry_id: row.get(4)?,
                        details: row.get(5)?,
                    })
                },
            )
            .map_err(|e| CredVaultError::Audit(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| CredVaultError::Audit(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }

    /// Return the path to the audit database (for testing/display).
    pub fn db_path(vault_dir: &Path) -> PathBuf {
        vault_dir.join("audit.db")
    }
}

/// Log an audit event for the vault selected on the command line.
///
/// Never fails the parent operation.
#[cfg(feature = "audit-log")]
pub fn log_audit(cli: &Cli, op: Operation, entry_id: Option<Uuid>, details: Option<&str>) {
    let paths = crate::vault::VaultPaths::new(&cli.vault);
    if let Some(audit) = AuditLog::open(paths.dir()) {
        audit.log(op, &vault_name(&paths), entry_id, details);
    }
}

#[cfg(not(feature = "audit-log"))]
pub fn log_audit(_cli: &Cli, _op: Operation, _entry_id: Option<Uuid>, _details: Option<&str>) {}

/// The name rows are recorded under: the vault's file name.
pub fn vault_name(paths: &crate::vault::VaultPaths) -> String {
    paths
        .main
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
