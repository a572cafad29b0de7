use crate::cli::GlobalFlags;
use crate::commands::view::SessionView;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let state = ctx.session.sign_out().await;
    output(&SessionView::from(state), flags.format)
}
