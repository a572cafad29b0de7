use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthSignInArgs;
use crate::commands::view::SessionView;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(
    args: &AuthSignInArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let state = ctx.session.sign_in(&args.email, &args.password).await?;
    output(&SessionView::from(state), flags.format)
}
