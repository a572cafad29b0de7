use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthConfirmArgs;
use crate::commands::view::SessionView;
use crate::context::AppContext;
use crate::output::output;

/// Confirm a pending identity and sign it in. The resolution cycle that
/// follows provisions the profile from the metadata captured at sign-up.
pub async fn handle(
    args: &AuthConfirmArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let Some(provider) = ctx.local_provider() else {
        anyhow::bail!("auth confirm is only available with the local provider; use the emailed link");
    };

    provider
        .confirm_email(&args.email)
        .await
        .with_context(|| format!("failed to confirm {}", args.email))?;

    let state = ctx.session.initialize().await;
    output(&SessionView::from(state), flags.format)
}
