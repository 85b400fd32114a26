//! Aggregate counts over the vault, recomputed on demand.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::report::generate_security_report_at;
use crate::vault::entry::{EntryType, VaultEntry};
use crate::vault::folder::VaultFolder;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VaultStatistics {
    /// Live (non-deleted) entries.
    pub total_entries: usize,
    pub logins: usize,
    pub secure_notes: usize,
    pub cards: usize,
    pub identities: usize,
    pub favorites: usize,
    pub deleted: usize,
    pub folders: usize,
    pub expired_cards: usize,
    pub weak_passwords: usize,
    pub old_passwords: usize,
    pub duplicate_passwords: usize,
    pub compromised_passwords: usize,
    pub without_2fa: usize,
    pub security_score: u8,
}

impl VaultStatistics {
    pub fn count_of(&self, kind: EntryType) -> usize {
        match kind {
            EntryType::Login => self.logins,
            EntryType::SecureNote => self.secure_notes,
            EntryType::Card => self.cards,
            EntryType::Identity => self.identities,
        }
    }
}

pub fn compute_statistics(
    entries: &[VaultEntry],
    folders: &[VaultFolder],
    now: DateTime<Utc>,
) -> VaultStatistics {
    let mut stats = VaultStatistics {
        folders: folders.len(),
        ..VaultStatistics::default()
    };

    for entry in entries {
        if entry.deleted {
            stats.deleted += 1;
            continue;
        }
        stats.total_entries += 1;
        match entry.entry_type() {
            EntryType::Login => stats.logins += 1,
            EntryType::SecureNote => stats.secure_notes += 1,
            EntryType::Card => stats.cards += 1,
            EntryType::Identity => stats.identities += 1,
        }
        if entry.favorite {
            stats.favorites += 1;
        }
        if entry.is_expired_at(now) {
            stats.expired_cards += 1;
        }
    }

    let report = generate_security_report_at(entries, now);
    stats.weak_passwords = report.weak_passwords;
    stats.old_passwords = report.old_passwords;
    stats.duplicate_passwords = report.duplicate_passwords;
    stats.compromised_passwords = report.compromised_passwords;
    stats.without_2fa = report.without_2fa;
    stats.security_score = report.score;
    stats
}
