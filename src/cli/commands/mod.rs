//! One module per subcommand.  Each exposes `execute(cli, ...)`.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod change_password;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod export;
pub mod folder;
pub mod generate;
pub mod get;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod report;
pub mod search;
pub mod trash;
