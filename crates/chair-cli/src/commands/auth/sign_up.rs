use chair_session::SignUpRequest;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthSignUpArgs;
use crate::commands::view::SessionView;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct SignUpResponse {
    needs_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionView>,
}

pub async fn handle(
    args: &AuthSignUpArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let request = SignUpRequest {
        email: args.email.clone(),
        password: args.password.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        school: args.school.clone(),
        organization: args.organization.clone(),
        chapter_code: args.chapter_code.clone(),
        role_name: args.role.clone(),
    };

    let outcome = ctx.session.sign_up(request).await?;

    let response = if outcome.needs_confirmation {
        SignUpResponse {
            needs_confirmation: true,
            note: flags.hint("check your email to confirm the account, then sign in"),
            session: None,
        }
    } else {
        SignUpResponse {
            needs_confirmation: false,
            note: None,
            session: Some(SessionView::from(ctx.session.state())),
        }
    };

    output(&response, flags.format)
}
