use clap::{Args, Subcommand};

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Create an account and its chapter membership.
    SignUp(AuthSignUpArgs),
    /// Sign in with email and password.
    SignIn(AuthSignInArgs),
    /// End the current session.
    SignOut,
    /// Confirm a pending email address (local provider only).
    Confirm(AuthConfirmArgs),
    /// Show the current session and resolved identity.
    Status,
}

#[derive(Clone, Debug, Args)]
pub struct AuthSignUpArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// School the chapter belongs to.
    #[arg(long)]
    pub school: String,
    /// Greek organization name.
    #[arg(long)]
    pub organization: String,
    #[arg(long)]
    pub chapter_code: String,
    /// Role to hold in the chapter (e.g. "Social Chair", "Member").
    #[arg(long)]
    pub role: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuthSignInArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfirmArgs {
    /// Email address of the pending identity.
    pub email: String,
}
