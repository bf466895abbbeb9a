//! Configuration file discovery.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use peerlink::PeerlinkConfig;
use std::path::{Path, PathBuf};

/// Default config file path in the platform config directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("rs", "peerlink", "peerlink")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// Resolve the config file path: the explicit one if given, else the default.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit.map_or_else(default_path, |p| Ok(p.to_path_buf()))
}

/// Load the file at `path` (defaults if it does not exist) and overlay the environment.
pub fn load(path: &Path) -> Result<PeerlinkConfig> {
    let config = PeerlinkConfig::load(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    Ok(config.apply_env())
}
