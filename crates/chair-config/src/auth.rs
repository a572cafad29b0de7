//! Identity provider configuration.

use serde::{Deserialize, Serialize};

/// Which identity provider backs the session bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// libSQL-backed provider living next to the application database.
    #[default]
    Local,
    /// Hosted GoTrue-compatible auth API.
    Gotrue,
}

fn default_keyring_service() -> String {
    "chair-cli".to_string()
}

/// Default session lifetime, in seconds.
const fn default_session_ttl_secs() -> u64 {
    3_600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Base URL of the hosted project (e.g. `https://abcd.supabase.co`).
    #[serde(default)]
    pub url: String,

    /// Public anon key sent as the `apikey` header.
    #[serde(default)]
    pub anon_key: String,

    /// Local provider only: hold new identities unconfirmed until
    /// `chair auth confirm` is run.
    #[serde(default)]
    pub require_email_confirmation: bool,

    /// Keyring service name the session token is stored under.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Local provider only: lifetime of issued sessions.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            url: String::new(),
            anon_key: String::new(),
            require_email_confirmation: false,
            keyring_service: default_keyring_service(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl AuthConfig {
    /// Check if the hosted provider has the minimum required fields.
    pub fn is_hosted_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }

    /// Check that the selected provider can actually be constructed.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if self.provider != ProviderKind::Gotrue {
            return Ok(());
        }
        let missing = match (self.url.is_empty(), self.anon_key.is_empty()) {
            (true, true) => "auth.url and auth.anon_key",
            (true, false) => "auth.url",
            (false, true) => "auth.anon_key",
            (false, false) => return Ok(()),
        };
        Err(crate::ConfigError::HostedAuthIncomplete { missing })
    }
}
