use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::view::SessionView;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthStatusResponse {
    provider: &'static str,
    token_source: Option<&'static str>,
    project_root: String,
    #[serde(flatten)]
    session: SessionView,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let state = ctx.session.initialize().await;
    let provider = ctx.session.provider();

    let status = AuthStatusResponse {
        provider: provider.name(),
        token_source: provider.tokens().detect_source(),
        project_root: ctx.project_root.display().to_string(),
        session: SessionView::from(state),
    };

    output(&status, flags.format)
}
