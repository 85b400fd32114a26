//! Random password generation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::{CredVaultError, Result};

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>?/~";

/// Characters easily confused when read aloud or copied by hand.
const AMBIGUOUS: &str = "Il1O0o|`'\"";

pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordOptions {
    pub length: usize,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 20,
            lowercase: true,
            uppercase: true,
            digits: true,
            symbols: true,
            exclude_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    fn classes(&self) -> Vec<Vec<char>> {
        [
            (self.lowercase, LOWERCASE),
            (self.uppercase, UPPERCASE),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, set)| {
            set.chars()
                .filter(|c| !self.exclude_ambiguous || !AMBIGUOUS.contains(*c))
                .collect()
        })
        .collect()
    }
}

/// Generate a password with at least one character from each enabled class.
pub fn generate_password(options: &PasswordOptions) -> Result<String> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(CredVaultError::GeneratorOptions(format!(
            "length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {}",
            options.length
        )));
    }
    let classes = options.classes();
    if classes.is_empty() {
        return Err(CredVaultError::GeneratorOptions(
            "enable at least one character class".into(),
        ));
    }

    let mut rng = rand::rng();
    let pool: Vec<char> = classes.iter().flatten().copied().collect();

    let mut chars: Vec<char> = classes
        .iter()
        .map(|class| class[rng.random_range(0..class.len())])
        .collect();
    while chars.len() < options.length {
        chars.push(pool[rng.random_range(0..pool.len())]);
    }
    chars.shuffle(&mut rng);

    Ok(chars.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_every_enabled_class() {
        for _ in 0..50 {
            let pw = generate_password(&PasswordOptions {
                length: 4,
                ..PasswordOptions::default()
            })
            .unwrap();
            assert_eq!(pw.chars().count(), 4);
            assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
            assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
            assert!(pw.chars().any(|c| c.is_ascii_digit()));
            assert!(pw.chars().any(|c| SYMBOLS.contains(c)));
        }
    }

    #[test]
    fn respects_disabled_classes_and_ambiguity() {
        let options = PasswordOptions {
            length: 64,
            symbols: false,
            uppercase: false,
            exclude_ambiguous: true,
            ..PasswordOptions::default()
        };
        let pw = generate_password(&options).unwrap();
        assert!(pw.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(!pw.chars().any(|c| AMBIGUOUS.contains(c)));
    }

    #[test]
    fn rejects_bad_options() {
        let none = PasswordOptions {
            lowercase: false,
            uppercase: false,
            digits: false,
            symbols: false,
            ..PasswordOptions::default()
        };
        assert!(generate_password(&none).is_err());

        let short = PasswordOptions {
            length: 2,
            ..PasswordOptions::default()
        };
        assert!(generate_password(&short).is_err());
    }
}
