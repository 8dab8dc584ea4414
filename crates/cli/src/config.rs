use anyhow::{Context, Result, bail};
use deskcheck_runtime_config::{CONFIG_FILE_NAME, SuiteConfig, apply_env_overrides};
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/deskcheck/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("deskcheck"))
}

/// `--config` wins, then `./deskcheck.toml`, then the user config dir.
pub fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Effective configuration and where it came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub from_file: bool,
    pub config: SuiteConfig,
}

/// File (or defaults when none exists) with environment overrides applied.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let cwd = std::env::current_dir().context("read current directory")?;
    let path = resolve_config_path(explicit, &cwd)?;
    load_with(&path, explicit.is_some(), |key| std::env::var(key).ok())
}

fn load_with<F>(path: &Path, required: bool, lookup: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let from_file = path.exists();
    if required && !from_file {
        bail!("config not found: {}", path.display());
    }

    let mut config = if from_file {
        SuiteConfig::load(path)?
    } else {
        SuiteConfig::default()
    };
    if apply_env_overrides(&mut config, lookup) {
        tracing::debug!("applied environment overrides");
    }

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        from_file,
        config,
    })
}

/// Write the default config to `path`. Refuses to clobber unless `force`.
pub fn init_at(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let body = SuiteConfig::default().to_toml_string()?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
