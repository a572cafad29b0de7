use chair_core::entities::{Chapter, Profile, Role};
use chair_core::enums::ResolutionStatus;
use chair_session::SessionState;
use serde::Serialize;

/// Printable snapshot of the session state.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub status: ResolutionStatus,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub profile: Option<Profile>,
    pub chapter: Option<Chapter>,
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SessionState> for SessionView {
    fn from(state: SessionState) -> Self {
        let email_confirmed = state
            .identity
            .as_ref()
            .is_some_and(chair_core::identity::AuthIdentity::is_confirmed);
        Self {
            status: state.status,
            email: state.identity.map(|identity| identity.email),
            email_confirmed,
            profile: state.resolved.profile,
            chapter: state.resolved.chapter,
            role: state.resolved.role,
            error: state.last_error,
        }
    }
}
