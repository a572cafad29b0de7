use crate::cli::GlobalFlags;
use crate::commands::view::SessionView;
use crate::context::AppContext;
use crate::output::output;

/// Restore the stored session, then run a fresh resolution for it.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let initial = ctx.session.initialize().await;
    tracing::debug!(status = %initial.status, "session restored");

    let state = ctx.session.refresh_user_data().await;
    output(&SessionView::from(state), flags.format)
}
