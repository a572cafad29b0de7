use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let roles = ctx
        .session
        .store()
        .list_roles()
        .await
        .context("failed to list roles")?;
    output(&roles, flags.format)
}
