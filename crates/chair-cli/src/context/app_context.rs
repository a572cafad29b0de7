use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chair_auth::{
    ConfirmationPolicy, GoTrueProvider, LocalIdentityProvider, LocalProviderOptions, Provider,
    TokenStore,
};
use chair_config::{AuthConfig, ChairConfig, ProviderKind};
use chair_db::service::ChairService;
use chair_session::{ResolverTimeouts, SessionBootstrap};

pub type Session = SessionBootstrap<Provider, Arc<ChairService>>;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub project_root: PathBuf,
    pub session: Session,
}

impl AppContext {
    /// Open the database, build the configured identity provider and wire both
    /// into a session bootstrap. No resolution cycle runs yet.
    pub async fn init(project_root: PathBuf, config: &ChairConfig) -> anyhow::Result<Self> {
        let db_path = config.database.path.clone();
        if !config.database.is_in_memory() {
            ensure_parent_dir(Path::new(&db_path))?;
        }

        let service = ChairService::new_local(&db_path)
            .await
            .context("failed to initialize chair-db service")?;

        let provider = build_provider(&config.auth, &db_path).await?;
        tracing::debug!(provider = provider.name(), db = %db_path, "app context ready");

        let session = SessionBootstrap::new(
            provider,
            Arc::new(service),
            ResolverTimeouts::from(&config.resolver),
        );

        Ok(Self {
            project_root,
            session,
        })
    }

    /// The local provider, when that is what the configuration selected.
    pub fn local_provider(&self) -> Option<&LocalIdentityProvider> {
        match self.session.provider() {
            Provider::Local(provider) => Some(provider),
            Provider::GoTrue(_) => None,
        }
    }
}

async fn build_provider(auth: &AuthConfig, db_path: &str) -> anyhow::Result<Provider> {
    let tokens = TokenStore::os(auth.keyring_service.clone());
    match auth.provider {
        ProviderKind::Local => {
            let confirmation = if auth.require_email_confirmation {
                ConfirmationPolicy::EmailLink
            } else {
                ConfirmationPolicy::Immediate
            };
            let options = LocalProviderOptions {
                confirmation,
                session_ttl: Duration::from_secs(auth.session_ttl_secs),
                tokens,
            };
            // Identities live in the same file as profiles.
            let provider = LocalIdentityProvider::open(db_path, options)
                .await
                .context("failed to open local identity provider")?;
            Ok(Provider::Local(provider))
        }
        ProviderKind::Gotrue => {
            let provider = GoTrueProvider::new(&auth.url, auth.anon_key.clone(), tokens)
                .context("failed to build hosted identity provider")?;
            Ok(Provider::GoTrue(provider))
        }
    }
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::ensure_parent_dir;

    #[test]
    fn creates_missing_parent_directories() {
        let temp = TempDir::new().expect("tempdir should create");
        let db = temp.path().join(".chair/nested/chair.db");

        ensure_parent_dir(&db).expect("parent should create");
        assert!(temp.path().join(".chair/nested").is_dir());
    }

    #[test]
    fn bare_file_name_needs_no_directory() {
        ensure_parent_dir(std::path::Path::new("chair.db")).expect("no-op should succeed");
    }
}
