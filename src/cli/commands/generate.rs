//! `credvault generate`: print a random password.  Does not touch the vault.

use crate::cli::{output, GenerateArgs};
use crate::errors::Result;
use crate::security::{analyze_password, generate_password, PasswordOptions};

/// Execute the `generate` command.
pub fn execute(args: &GenerateArgs) -> Result<()> {
    let options = options_from(args);
    let password = generate_password(&options)?;
    println!("{password}");

    let analysis = analyze_password(&password);
    output::print_strength(analysis.level, analysis.score);
    Ok(())
}

fn options_from(args: &GenerateArgs) -> PasswordOptions {
    PasswordOptions {
        length: args.length,
        lowercase: !args.no_lowercase,
        uppercase: !args.no_uppercase,
        digits: !args.no_digits,
        symbols: !args.no_symbols,
        exclude_ambiguous: args.exclude_ambiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_disable_classes() {
        let args = GenerateArgs {
            length: 12,
            no_lowercase: false,
            no_uppercase: true,
            no_digits: false,
            no_symbols: true,
            exclude_ambiguous: true,
        };
        let options = options_from(&args);
        assert_eq!(options.length, 12);
        assert!(options.lowercase && options.digits);
        assert!(!options.uppercase && !options.symbols);
        assert!(options.exclude_ambiguous);
    }
}
