use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::schema::HearthConfig;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("hearth"))
}

/// Default location of config.toml
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Resolve the config path, preferring an explicit override
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand_path(&path.to_string_lossy())),
        None => default_config_path(),
    }
}

/// Load the configuration from the resolved path
pub fn load(explicit: Option<&Path>) -> Result<(PathBuf, HearthConfig)> {
    let path = config_path(explicit)?;
    let config = HearthConfig::load(&path)?;
    Ok((path, config))
}

/// Expand `~` and environment variables in a configured path
///
/// Unknown variables are left as written.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::debug!("could not expand {raw}: {e}");
            PathBuf::from(shellexpand::tilde(raw).as_ref())
        }
    }
}
