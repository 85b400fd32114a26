use clap::Parser;
use credvault::cli::commands;
use credvault::cli::{AuditArgs, Cli, Commands};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Diagnostics go to stderr so they never mix with command output.
/// Verbosity comes from `CREDVAULT_LOG` (e.g. `credvault=debug`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("CREDVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add { ref kind } => commands::add::execute(&cli, kind),
        Commands::List { deleted } => commands::list::execute(&cli, deleted),
        Commands::Search(ref args) => commands::search::execute(&cli, args),
        Commands::Get {
            ref entry,
            show,
            copy,
        } => commands::get::execute(&cli, entry, show, copy),
        Commands::Edit(ref args) => commands::edit::execute(&cli, args),
        Commands::Delete {
            ref entry,
            permanent,
            force,
        } => commands::delete::execute(&cli, entry, permanent, force),
        Commands::Restore { ref entry } => commands::trash::restore(&cli, entry),
        Commands::Cleanup { days } => commands::trash::cleanup(&cli, days),
        Commands::EmptyTrash { force } => commands::trash::empty(&cli, force),
        Commands::ChangePassword => commands::change_password::execute(&cli),
        Commands::Import {
            ref file,
            encrypted,
        } => commands::import_cmd::execute(&cli, file, encrypted),
        Commands::Export {
            ref output,
            include_deleted,
            encrypted,
        } => commands::export::execute(&cli, output.as_deref(), include_deleted, encrypted),
        Commands::Report => commands::report::execute(&cli),
        Commands::Stats => commands::report::stats(&cli),
        Commands::Generate(ref args) => commands::generate::execute(args),
        Commands::Folder { ref action } => commands::folder::execute(&cli, action),
        Commands::Audit(ref args) => audit(&cli, args),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        credvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(feature = "audit-log")]
fn audit(cli: &Cli, args: &AuditArgs) -> credvault::errors::Result<()> {
    commands::audit_cmd::execute(cli, args)
}

#[cfg(not(feature = "audit-log"))]
fn audit(_cli: &Cli, _args: &AuditArgs) -> credvault::errors::Result<()> {
    Err(credvault::errors::CredVaultError::Audit(
        "this build was compiled without the audit-log feature".into(),
    ))
}
