//! Failures raised while loading or validating `ChairConfig`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A TOML layer or `CHAIR_*` variable could not be merged or extracted.
    #[error("failed to load chair configuration: {0}")]
    Load(#[from] figment::Error),

    /// `auth.provider = "gotrue"` was selected without the hosted endpoint keys.
    #[error("auth.provider is gotrue but {missing} is not set")]
    HostedAuthIncomplete { missing: &'static str },

    /// A resolver ceiling would make every cycle time out.
    #[error("resolver timeout {field} is unusable: {reason}")]
    ResolverTimeout { field: &'static str, reason: String },
}
