use chair_config::{ChairConfig, ProviderKind};

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &ChairConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &ChairConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.auth.is_hosted_configured() && has_single_underscore_key(&env_keys, "CHAIR_AUTH") {
        warnings.push(
            "Auth config appears default while CHAIR_AUTH_* env vars exist. Use double underscores (example: CHAIR_AUTH__URL)."
                .to_string(),
        );
    }

    if config.auth.provider == ProviderKind::Local && config.auth.is_hosted_configured() {
        warnings.push(
            "auth.url and auth.anon_key are set but auth.provider is local; the hosted provider is not used."
                .to_string(),
        );
    }

    if has_single_underscore_key(&env_keys, "CHAIR_RESOLVER") {
        warnings.push(
            "CHAIR_RESOLVER_* env vars are ignored. Use double underscores (example: CHAIR_RESOLVER__FETCH_TIMEOUT_MS)."
                .to_string(),
        );
    }

    if has_single_underscore_key(&env_keys, "CHAIR_DATABASE") {
        warnings.push(
            "CHAIR_DATABASE_* env vars are ignored. Use double underscores (example: CHAIR_DATABASE__PATH)."
                .to_string(),
        );
    }

    warnings
}

fn has_single_underscore_key(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| {
        key.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('_') && !rest.starts_with("__"))
    })
}
