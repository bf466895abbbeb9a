//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Check secure sessions to Hyperledger Fabric style ledger peers
///
/// Settings come from a TOML config file, overridden by MSP_ID, PEER_ENDPOINT,
/// PEER_HOST_ALIAS, TLS_CERT_PATH, CERT_PATH, KEY_DIRECTORY_PATH and friends.
#[derive(Parser, Debug)]
#[command(name = "peerlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: platform config directory)
    #[arg(short, long, env = "PEERLINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a full session against the configured peer, report it and close it
    Check,

    /// Show the details of a certificate file
    Inspect(InspectArgs),

    /// Sign a hex-encoded digest with a key from a keystore directory
    Sign(SignArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PEM or DER certificate file
    pub cert: PathBuf,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Keystore directory (default: configured key directory)
    #[arg(short, long)]
    pub key_dir: Option<PathBuf>,

    /// Fail if the directory holds more than one key file
    #[arg(long)]
    pub require_single: bool,

    /// Digest to sign, hex-encoded
    pub digest: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML (default)
    Show,

    /// Print the config file path
    Path,
}
