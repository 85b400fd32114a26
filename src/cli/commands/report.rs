//! `credvault report` and `credvault stats`: security posture of the vault.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `report` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = open_vault(cli)?;
    let report = store.security_report()?;
    store.lock()?;

    if report.total_logins == 0 {
        output::info("No logins to analyze.");
        return Ok(());
    }
    output::print_security_report(&report);
    if report.weak_passwords > 0 {
        output::tip("Run `credvault search --weak` to list them, then `credvault edit <NAME> --generate`.");
    }
    Ok(())
}

/// Execute the `stats` command.
pub fn stats(cli: &Cli) -> Result<()> {
    let mut store = open_vault(cli)?;
    let stats = store.statistics()?;
    store.lock()?;

    output::print_statistics(&stats);
    Ok(())
}
