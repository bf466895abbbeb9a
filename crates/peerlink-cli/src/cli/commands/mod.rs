//! Command implementations.

pub mod check;
pub mod config;
pub mod inspect;
pub mod sign;

use peerlink::PeerlinkConfig;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Config file path (may not exist)
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl Context {
    /// Effective configuration: config file overlaid with the environment.
    pub fn config(&self) -> anyhow::Result<PeerlinkConfig> {
        crate::config::load(&self.config_path)
    }
}
