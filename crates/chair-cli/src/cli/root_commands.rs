use clap::Subcommand;

use crate::cli::subcommands::AuthCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Account and session management.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Re-resolve profile, chapter and role for the signed-in user.
    Refresh,
    /// List the roles a member can hold.
    Roles,
}
