mod confirm;
mod sign_in;
mod sign_out;
mod sign_up;
mod status;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthCommands;
use crate::context::AppContext;

/// Handle `chair auth <subcommand>`.
pub async fn handle(
    action: &AuthCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AuthCommands::SignUp(args) => sign_up::handle(args, ctx, flags).await,
        AuthCommands::SignIn(args) => sign_in::handle(args, ctx, flags).await,
        AuthCommands::SignOut => sign_out::handle(ctx, flags).await,
        AuthCommands::Confirm(args) => confirm::handle(args, ctx, flags).await,
        AuthCommands::Status => status::handle(ctx, flags).await,
    }
}
