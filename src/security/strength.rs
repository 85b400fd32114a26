//! Password strength scoring.
//!
//! Scoring rules:
//!
//! | rule                                   | points |
//! |----------------------------------------|--------|
//! | length ≥ 12 / ≥ 8                      | +40 / +20 |
//! | each class present (lower, upper, digit, symbol) | +15 |
//! | contains a common substring            | −30    |
//! | three identical characters in a row    | −15    |
//!
//! The total is clamped to 0–100 and mapped onto six levels.

use std::fmt;

use serde::Serialize;

/// Substrings that make a password easy to guess regardless of length.
pub const COMMON_SUBSTRINGS: &[&str] = &[
    "password", "123456", "qwerty", "abc123", "letmein", "welcome", "admin", "iloveyou",
    "monkey", "dragon", "111111", "sunshine",
];

/// Passwords treated as already compromised.
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "12345", "1234567", "1234567890", "password",
    "password1", "password123", "qwerty", "qwerty123", "abc123", "111111", "123123",
    "000000", "iloveyou", "admin", "admin123", "welcome", "welcome1", "letmein", "monkey",
    "dragon", "sunshine", "princess", "football", "baseball", "master", "shadow",
    "superman", "trustno1", "passw0rd", "changeme", "secret", "login",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Strong,
    VeryStrong,
}

impl StrengthLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=19 => StrengthLevel::VeryWeak,
            20..=39 => StrengthLevel::Weak,
            40..=59 => StrengthLevel::Fair,
            60..=74 => StrengthLevel::Good,
            75..=89 => StrengthLevel::Strong,
            _ => StrengthLevel::VeryStrong,
        }
    }

    /// Weak enough to be flagged in a security report.
    pub fn is_weak(self) -> bool {
        self <= StrengthLevel::Fair
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrengthLevel::VeryWeak => "very weak",
            StrengthLevel::Weak => "weak",
            StrengthLevel::Fair => "fair",
            StrengthLevel::Good => "good",
            StrengthLevel::Strong => "strong",
            StrengthLevel::VeryStrong => "very strong",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordAnalysis {
    pub level: StrengthLevel,
    pub score: u8,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

fn has_repeated_run(password: &str, run: usize) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(run).any(|w| w.iter().all(|c| *c == w[0]))
}

pub fn analyze_password(password: &str) -> PasswordAnalysis {
    let mut score: i32 = 0;
    let mut weaknesses = Vec::new();
    let mut suggestions = Vec::new();

    let length = password.chars().count();
    if length >= 12 {
        score += 40;
    } else if length >= 8 {
        score += 20;
        suggestions.push("Use at least 12 characters".to_string());
    } else {
        weaknesses.push(format!("Only {length} characters long"));
        suggestions.push("Use at least 12 characters".to_string());
    }

    let classes = [
        ("lowercase letters", password.chars().any(|c| c.is_lowercase())),
        ("uppercase letters", password.chars().any(|c| c.is_uppercase())),
        ("digits", password.chars().any(|c| c.is_ascii_digit())),
        (
            "symbols",
            password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        ),
    ];
    for (name, present) in classes {
        if present {
            score += 15;
        } else {
            weaknesses.push(format!("No {name}"));
            suggestions.push(format!("Add {name}"));
        }
    }

    let lowered = password.to_lowercase();
    if let Some(common) = COMMON_SUBSTRINGS.iter().find(|s| lowered.contains(*s)) {
        score -= 30;
        weaknesses.push(format!("Contains the common pattern '{common}'"));
        suggestions.push("Avoid dictionary words and keyboard patterns".to_string());
    }

    if has_repeated_run(password, 3) {
        score -= 15;
        weaknesses.push("Repeats the same character three or more times".to_string());
        suggestions.push("Avoid repeated characters".to_string());
    }

    let score = u8::try_from(score.clamp(0, 100)).unwrap_or(0);
    PasswordAnalysis {
        level: StrengthLevel::from_score(score),
        score,
        weaknesses,
        suggestions,
    }
}

/// Whether `password` appears in the embedded list of breached passwords.
pub fn is_common_password(password: &str) -> bool {
    let lowered = password.to_lowercase();
    COMMON_PASSWORDS.contains(&lowered.as_str())
}
