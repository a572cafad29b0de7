mod auth;

pub use auth::{AuthCommands, AuthConfirmArgs, AuthSignInArgs, AuthSignUpArgs};
