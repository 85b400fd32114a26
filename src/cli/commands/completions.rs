//! `credvault completions`: print a shell completion script to stdout.
//!
//!   credvault completions bash > ~/.bash_completion.d/credvault
//!   credvault completions zsh > "${fpath[1]}/_credvault"
//!   credvault completions fish > ~/.config/fish/completions/credvault.fish

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{CredVaultError, Result};

/// Shell names accepted on the command line, as shown in errors.
const SUPPORTED: &str = "bash, zsh, fish, powershell (ps), elvish";

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell = parse_shell(shell)?;
    let mut out = io::stdout().lock();
    write_script(shell, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Render the completion script for `shell` into `out`, named after the clap command.
fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
    Ok(())
}

fn parse_shell(name: &str) -> Result<Shell> {
    match name.trim().to_ascii_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "ps" | "pwsh" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        other => Err(CredVaultError::CommandFailed(format!(
            "unknown shell '{other}'; supported: {SUPPORTED}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_script(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn shell_names_are_case_insensitive() {
        assert_eq!(parse_shell("bash").unwrap(), Shell::Bash);
        assert_eq!(parse_shell(" Zsh ").unwrap(), Shell::Zsh);
        assert_eq!(parse_shell("FISH").unwrap(), Shell::Fish);
        assert_eq!(parse_shell("ps").unwrap(), Shell::PowerShell);
        assert_eq!(parse_shell("pwsh").unwrap(), Shell::PowerShell);
    }

    #[test]
    fn unknown_shell_lists_the_supported_ones() {
        let err = parse_shell("csh").unwrap_err().to_string();
        assert!(err.contains("csh"));
        assert!(err.contains("powershell"));
        assert!(parse_shell("").is_err());
    }

    #[test]
    fn bash_script_covers_vault_subcommands() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("credvault"));
        for sub in ["empty-trash", "change-password", "folder", "restore"] {
            assert!(bash.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn fish_script_completes_the_vault_flag() {
        let fish = script(Shell::Fish);
        assert!(fish.contains("complete -c credvault"));
        assert!(fish.contains("vault"));
    }
}
