//! Folders group entries into a tree.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SchemaError;

fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// A named folder, optionally nested under a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultFolder {
    #[serde(default = "new_id")]
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl VaultFolder {
    pub fn new(name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id,
        }
    }

    /// Load a folder record from interchange JSON.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let folder: VaultFolder =
            serde_json::from_value(value).map_err(|e| SchemaError::InvalidRecord(e.to_string()))?;
        if folder.name.trim().is_empty() {
            return Err(SchemaError::InvalidRecord(format!(
                "folder {} has an empty name",
                folder.id
            )));
        }
        if folder.parent_id == Some(folder.id) {
            return Err(SchemaError::InvalidRecord(format!(
                "folder {} is its own parent",
                folder.id
            )));
        }
        Ok(folder)
    }
}

/// Walk parent links from `start`; `true` if `target` is reached.
///
/// Stops after `folders.len()` hops so a corrupted, already-cyclic set
/// cannot loop forever.
pub(crate) fn is_descendant_or_self(folders: &[VaultFolder], start: Uuid, target: Uuid) -> bool {
    let mut current = Some(start);
    for _ in 0..=folders.len() {
        match current {
            Some(id) if id == target => return true,
            Some(id) => current = folders.iter().find(|f| f.id == id).and_then(|f| f.parent_id),
            None => return false,
        }
    }
    false
}

/// Names from the root down to `id`, e.g. `["Work", "Servers"]`.
pub(crate) fn path_names(folders: &[VaultFolder], id: Uuid) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(id);
    while let Some(folder) = current.and_then(|id| folders.iter().find(|f| f.id == id)) {
        if names.len() > folders.len() {
            break;
        }
        names.push(folder.name.clone());
        current = folder.parent_id;
    }
    names.reverse();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Vec<VaultFolder> {
        let root = VaultFolder::new("Work", None);
        let child = VaultFolder::new("Servers", Some(root.id));
        let grandchild = VaultFolder::new("Prod", Some(child.id));
        vec![root, child, grandchild]
    }

    #[test]
    fn descendant_walk() {
        let folders = tree();
        let (root, grandchild) = (folders[0].id, folders[2].id);
        assert!(is_descendant_or_self(&folders, grandchild, root));
        assert!(is_descendant_or_self(&folders, root, root));
        assert!(!is_descendant_or_self(&folders, root, grandchild));
    }

    #[test]
    fn path_from_root() {
        let folders = tree();
        assert_eq!(path_names(&folders, folders[2].id), vec!["Work", "Servers", "Prod"]);
        assert!(path_names(&folders, Uuid::new_v4()).is_empty());
    }

    #[test]
    fn from_value_rejects_self_parent() {
        let id = Uuid::new_v4();
        let err = VaultFolder::from_value(json!({ "id": id, "name": "x", "parentId": id }))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRecord(_)));
    }
}
