//! Vault-wide security report over live login entries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::strength::{analyze_password, is_common_password};
use crate::vault::entry::VaultEntry;

/// A password unchanged for longer than this many days is "old".
pub const OLD_PASSWORD_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    Weak,
    Duplicate,
    Old,
    Compromised,
    MissingTwoFactor,
}

impl IssueKind {
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::Weak => "weak password",
            IssueKind::Duplicate => "reused password",
            IssueKind::Old => "password older than a year",
            IssueKind::Compromised => "commonly breached password",
            IssueKind::MissingTwoFactor => "no two-factor secret",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryIssues {
    pub entry_id: Uuid,
    pub entry_name: String,
    pub issues: Vec<IssueKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityReport {
    pub total_logins: usize,
    pub weak_passwords: usize,
    pub duplicate_passwords: usize,
    pub old_passwords: usize,
    pub compromised_passwords: usize,
    pub without_2fa: usize,
    /// 0–100, higher is better.
    pub score: u8,
    /// Entries with at least one issue, in collection order.
    pub entries: Vec<EntryIssues>,
}

pub fn generate_security_report<'a, I>(entries: I) -> SecurityReport
where
    I: IntoIterator<Item = &'a VaultEntry>,
{
    generate_security_report_at(entries, Utc::now())
}

/// Report with an explicit clock for the age check.
pub fn generate_security_report_at<'a, I>(entries: I, now: DateTime<Utc>) -> SecurityReport
where
    I: IntoIterator<Item = &'a VaultEntry>,
{
    let mut report = SecurityReport {
        total_logins: 0,
        weak_passwords: 0,
        duplicate_passwords: 0,
        old_passwords: 0,
        compromised_passwords: 0,
        without_2fa: 0,
        score: 100,
        entries: Vec::new(),
    };
    let mut seen: HashSet<&str> = HashSet::new();

    for entry in entries.into_iter().filter(|e| !e.deleted) {
        let Some(login) = entry.as_login() else {
            continue;
        };
        report.total_logins += 1;
        let mut issues = Vec::new();

        if analyze_password(&login.password).level.is_weak() {
            report.weak_passwords += 1;
            issues.push(IssueKind::Weak);
        }
        // The first holder of a password is not a reuse.
        if !login.password.is_empty() && !seen.insert(login.password.as_str()) {
            report.duplicate_passwords += 1;
            issues.push(IssueKind::Duplicate);
        }
        if entry.password_age_days_at(now) > OLD_PASSWORD_DAYS {
            report.old_passwords += 1;
            issues.push(IssueKind::Old);
        }
        if is_common_password(&login.password) {
            report.compromised_passwords += 1;
            issues.push(IssueKind::Compromised);
        }
        if !login.has_totp() {
            report.without_2fa += 1;
            issues.push(IssueKind::MissingTwoFactor);
        }

        if !issues.is_empty() {
            report.entries.push(EntryIssues {
                entry_id: entry.id,
                entry_name: entry.name.clone(),
                issues,
            });
        }
    }

    report.score = aggregate_score(&report);
    report
}

fn aggregate_score(report: &SecurityReport) -> u8 {
    if report.total_logins == 0 {
        return 100;
    }
    let n = report.total_logins as f64;
    let ratio = |count: usize| count as f64 / n;
    let penalty = ratio(report.weak_passwords) * 100.0
        + ratio(report.duplicate_passwords) * 50.0
        + ratio(report.old_passwords) * 10.0
        + ratio(report.without_2fa) * 5.0;
    (100.0 - penalty).clamp(0.0, 100.0).round() as u8
}
