use std::path::{Path, PathBuf};

use anyhow::Context;
use chair_config::ChairConfig;

use crate::cli::GlobalFlags;

/// Resolve the project root and make it the working directory, so the
/// project's `.chair/config.toml` and relative database paths resolve there.
pub fn enter_project_root(flags: &GlobalFlags) -> anyhow::Result<PathBuf> {
    let root = resolve_project_root(flags.project.as_deref())?;
    std::env::set_current_dir(&root)
        .with_context(|| format!("failed to enter project root {}", root.display()))?;
    Ok(root)
}

fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);

        if explicit
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == ".chair")
        {
            return explicit
                .parent()
                .map(Path::to_path_buf)
                .context("invalid --project path: '.chair' directory has no parent");
        }

        if explicit.is_dir() {
            return Ok(explicit);
        }

        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    // Outside any project the current directory becomes one on first write.
    Ok(crate::context::find_project_root(&cwd).unwrap_or(cwd))
}

/// Load `.env` from the project root, then the layered config.
pub fn load_config(project_root: &Path) -> anyhow::Result<ChairConfig> {
    let env_path = project_root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }

    let config = ChairConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::resolve_project_root;

    #[test]
    fn explicit_dot_chair_path_resolves_to_parent() {
        let temp = TempDir::new().expect("tempdir should create");
        let dot = temp.path().join(".chair");
        std::fs::create_dir(&dot).expect(".chair should create");

        let root = resolve_project_root(dot.to_str()).expect("should resolve");
        assert_eq!(root, temp.path());
    }

    #[test]
    fn explicit_directory_is_used_as_is() {
        let temp = TempDir::new().expect("tempdir should create");
        let root = resolve_project_root(temp.path().to_str()).expect("should resolve");
        assert_eq!(root, temp.path());
    }

    #[test]
    fn missing_explicit_directory_is_an_error() {
        let temp = TempDir::new().expect("tempdir should create");
        let missing = temp.path().join("nope");
        let err = resolve_project_root(missing.to_str()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
