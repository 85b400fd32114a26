//! Security analysis: password strength, vault-wide report, statistics,
//! and password generation.

pub mod generator;
pub mod report;
pub mod stats;
pub mod strength;

pub use generator::{generate_password, PasswordOptions};
pub use report::{generate_security_report, IssueKind, SecurityReport};
pub use stats::VaultStatistics;
pub use strength::{analyze_password, PasswordAnalysis, StrengthLevel};
