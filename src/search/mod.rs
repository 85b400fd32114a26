//! Multi-predicate search over the entry collection.
//!
//! A `VaultFilter` is a conjunction: every predicate that is set must
//! hold, and unset predicates match everything.  Predicates are checked
//! in a fixed order (deletion partition, free text, type, tags, folder,
//! favorites, security level, then the login/card checks) and results
//! keep the collection's insertion order.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::security::strength::analyze_password;
use crate::vault::entry::{EntryType, SecurityLevel, VaultEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultFilter {
    /// Case-insensitive substring of `VaultEntry::full_text`.
    pub text: Option<String>,
    /// Entry must be one of these types.
    pub types: Option<HashSet<EntryType>>,
    /// Entry must carry every one of these tags.
    pub tags: BTreeSet<String>,
    pub folder_id: Option<Uuid>,
    pub favorites_only: bool,
    pub min_security_level: Option<SecurityLevel>,
    /// Logins whose password scores Fair or lower.
    pub weak_only: bool,
    /// Logins without a TOTP secret.
    pub no_two_factor: bool,
    /// Cards past their expiry month.
    pub expired_cards: bool,
    /// Logins whose password is older than this many days.
    pub older_than_days: Option<i64>,
    /// Search the trash instead of the live entries.
    pub deleted_only: bool,
}

impl VaultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn of_type(mut self, kind: EntryType) -> Self {
        self.types.get_or_insert_with(HashSet::new).insert(kind);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn in_folder(mut self, folder_id: Uuid) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn favorites(mut self) -> Self {
        self.favorites_only = true;
        self
    }

    pub fn min_level(mut self, level: SecurityLevel) -> Self {
        self.min_security_level = Some(level);
        self
    }

    pub fn weak(mut self) -> Self {
        self.weak_only = true;
        self
    }

    pub fn without_two_factor(mut self) -> Self {
        self.no_two_factor = true;
        self
    }

    pub fn expired(mut self) -> Self {
        self.expired_cards = true;
        self
    }

    pub fn older_than(mut self, days: i64) -> Self {
        self.older_than_days = Some(days);
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted_only = true;
        self
    }

    /// Whether `entry` satisfies every active predicate as of `now`.
    pub fn matches(&self, entry: &VaultEntry, now: DateTime<Utc>) -> bool {
        if entry.deleted != self.deleted_only {
            return false;
        }

        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            if !entry.full_text().to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(types) = &self.types {
            if !types.contains(&entry.entry_type()) {
                return false;
            }
        }

        if !self.tags.is_subset(&entry.tags) {
            return false;
        }

        if let Some(folder_id) = self.folder_id {
            if entry.folder_id != Some(folder_id) {
                return false;
            }
        }

        if self.favorites_only && !entry.favorite {
            return false;
        }

        if let Some(min) = self.min_security_level {
            if entry.security_level < min {
                return false;
            }
        }

        let login = entry.as_login();

        if self.weak_only
            && !login.is_some_and(|l| analyze_password(&l.password).level.is_weak())
        {
            return false;
        }

        if self.no_two_factor && !login.is_some_and(|l| !l.has_totp()) {
            return false;
        }

        if self.expired_cards && !entry.is_expired_at(now) {
            return false;
        }

        if let Some(days) = self.older_than_days {
            if login.is_none() || entry.password_age_days_at(now) <= days {
                return false;
            }
        }

        true
    }
}

/// Entries matching `filter`, in insertion order.
pub fn search<'a>(entries: &'a [VaultEntry], filter: &VaultFilter) -> Vec<&'a VaultEntry> {
    search_at(entries, filter, Utc::now())
}

pub fn search_at<'a>(
    entries: &'a [VaultEntry],
    filter: &VaultFilter,
    now: DateTime<Utc>,
) -> Vec<&'a VaultEntry> {
    entries.iter().filter(|e| filter.matches(e, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Vec<VaultEntry> {
        let mut trashed = VaultEntry::login("Old bank", "me", "x");
        trashed.mark_deleted(Utc::now());
        vec![
            VaultEntry::login("GitHub", "octocat", "Tr0ub4dor&3xYz!")
                .with_tags(["work", "dev"])
                .with_favorite(true),
            VaultEntry::login("Mail", "me@example.com", "password1").with_tags(["personal"]),
            VaultEntry::secure_note("Server notes", "ssh root@host").with_tags(["work"]),
            trashed,
        ]
    }

    fn names(found: &[&VaultEntry]) -> Vec<String> {
        found.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn empty_filter_returns_live_entries_in_order() {
        let entries = sample();
        let found = search(&entries, &VaultFilter::new());
        assert_eq!(names(&found), vec!["GitHub", "Mail", "Server notes"]);
    }

    #[test]
    fn deleted_partition_is_exclusive() {
        let entries = sample();
        let found = search(&entries, &VaultFilter::new().deleted());
        assert_eq!(names(&found), vec!["Old bank"]);
    }

    #[test]
    fn text_is_case_insensitive() {
        let entries = sample();
        let found = search(&entries, &VaultFilter::new().text("OCTO"));
        assert_eq!(names(&found), vec!["GitHub"]);
    }

    #[test]
    fn tags_must_all_be_present() {
        let entries = sample();
        let found = search(&entries, &VaultFilter::new().tag("work").tag("dev"));
        assert_eq!(names(&found), vec!["GitHub"]);
        let found = search(&entries, &VaultFilter::new().tag("work"));
        assert_eq!(names(&found), vec!["GitHub", "Server notes"]);
    }

    #[test]
    fn weak_filter_only_matches_logins() {
        let entries = sample();
        let found = search(&entries, &VaultFilter::new().weak());
        assert_eq!(names(&found), vec!["Mail"]);
    }

    #[test]
    fn type_and_level_filters() {
        let mut entries = sample();
        entries[0].security_level = SecurityLevel::Critical;
        let found = search(
            &entries,
            &VaultFilter::new()
                .of_type(EntryType::Login)
                .min_level(SecurityLevel::High),
        );
        assert_eq!(names(&found), vec!["GitHub"]);
    }

    #[test]
    fn older_than_uses_password_age() {
        let mut entries = sample();
        entries[1].password_last_changed = Utc::now() - Duration::days(100);
        let found = search(&entries, &VaultFilter::new().older_than(90));
        assert_eq!(names(&found), vec!["Mail"]);
    }
}
