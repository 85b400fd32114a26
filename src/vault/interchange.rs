//! JSON interchange: `{ "items": [...], "folders": [...] }`.
//!
//! Parsing is lenient per record and strict per document: a document that
//! is not an object with an `items` array is rejected outright, but a
//! single bad item or folder is skipped, logged and reported.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::entry::VaultEntry;
use super::folder::VaultFolder;
use crate::errors::{Result, SchemaError};

/// Which list a skipped record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Item,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    /// Position in the source array.
    pub index: usize,
    pub reason: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub folders_imported: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Records that survived parsing, plus the ones that did not.
#[derive(Debug, Default)]
pub struct ParsedInterchange {
    pub entries: Vec<VaultEntry>,
    pub folders: Vec<VaultFolder>,
    pub skipped: Vec<SkippedRecord>,
}

fn records(root: &mut serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(SchemaError::MalformedDocument(format!("'{key}' must be an array")).into()),
    }
}

pub fn parse_interchange(json: &str) -> Result<ParsedInterchange> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| SchemaError::MalformedDocument(format!("not valid JSON: {e}")))?;
    let Value::Object(mut root) = root else {
        return Err(SchemaError::MalformedDocument("top level must be an object".into()).into());
    };
    if !root.contains_key("items") {
        return Err(SchemaError::MissingField("items").into());
    }

    let items = records(&mut root, "items")?;
    let folders = records(&mut root, "folders")?;
    let mut parsed = ParsedInterchange::default();

    for (index, value) in folders.into_iter().enumerate() {
        match VaultFolder::from_value(value) {
            Ok(folder) => parsed.folders.push(folder),
            Err(e) => {
                warn!(index, error = %e, "skipping folder record");
                parsed.skipped.push(SkippedRecord {
                    kind: RecordKind::Folder,
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    for (index, value) in items.into_iter().enumerate() {
        match VaultEntry::from_value(value) {
            Ok(entry) => parsed.entries.push(entry),
            Err(e) => {
                warn!(index, error = %e, "skipping item record");
                parsed.skipped.push(SkippedRecord {
                    kind: RecordKind::Item,
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(parsed)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterchangeRef<'a> {
    exported_at: DateTime<Utc>,
    items: Vec<&'a VaultEntry>,
    folders: &'a [VaultFolder],
}

/// Pretty-printed interchange JSON for the given entries and folders.
pub fn render_interchange<'a, I>(entries: I, folders: &'a [VaultFolder]) -> Result<String>
where
    I: IntoIterator<Item = &'a VaultEntry>,
{
    let document = InterchangeRef {
        exported_at: Utc::now(),
        items: entries.into_iter().collect(),
        folders,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| SchemaError::MalformedDocument(format!("export: {e}")).into())
}
