//! # chair-config
//!
//! Layered configuration loading using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CHAIR_*` prefix, `__` as separator)
//! 2. Externally sourced overrides (see [`ChairConfig::load_with_env_overrides`])
//! 3. Project-level `.chair/config.toml`
//! 4. User-level `~/.config/chair/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CHAIR_AUTH__URL` -> `auth.url`, `CHAIR_RESOLVER__FETCH_TIMEOUT_MS`
//! -> `resolver.fetch_timeout_ms`, etc. The `__` (double underscore) separates
//! nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use chair_config::ChairConfig;
//!
//! let config = ChairConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod auth;
mod database;
mod error;
mod resolver;

pub use auth::{AuthConfig, ProviderKind};
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use resolver::ResolverConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_PREFIX: &str = "CHAIR_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChairConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl ChairConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a section is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env_overrides(&[])
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a section is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Load configuration with additional `CHAIR_*` key/value pairs sourced
    /// from outside the process environment. Real environment variables still
    /// take precedence over these overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a section is invalid.
    pub fn load_with_env_overrides(overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_with_overrides(overrides).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints after extraction.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.resolver.validate()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        Self::figment_with_overrides(&[])
    }

    fn figment_with_overrides(overrides: &[(String, String)]) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".chair/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: External overrides
        for (key, value) in overrides {
            if let Some(path) = override_key_path(key) {
                let parsed: Value = value.parse().unwrap_or_else(|_| Value::from(value.clone()));
                figment = figment.merge(Serialized::default(&path, parsed));
            }
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chair").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or falls back to the
    /// current dir. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

/// `CHAIR_AUTH__ANON_KEY` -> `auth.anon_key`. Keys without the prefix are ignored.
fn override_key_path(key: &str) -> Option<String> {
    let rest = key.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(
        rest.split("__")
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("."),
    )
}
