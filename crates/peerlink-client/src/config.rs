//! Connection configuration.
//!
//! Every value has a default matching the Fabric test network's first
//! organization, so an empty TOML file or an empty environment still yields a
//! usable configuration.

use peerlink_core::{PeerlinkError, Result, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::signer::KeySelection;

/// Environment variables read by [`PeerlinkConfig::from_env`]
pub mod env {
    pub const MSP_ID: &str = "MSP_ID";
    pub const CHANNEL_NAME: &str = "CHANNEL_NAME";
    pub const CHAINCODE_NAME: &str = "CHAINCODE_NAME";
    pub const CRYPTO_PATH: &str = "CRYPTO_PATH";
    pub const KEY_DIRECTORY_PATH: &str = "KEY_DIRECTORY_PATH";
    pub const CERT_PATH: &str = "CERT_PATH";
    pub const TLS_CERT_PATH: &str = "TLS_CERT_PATH";
    pub const PEER_ENDPOINT: &str = "PEER_ENDPOINT";
    pub const PEER_HOST_ALIAS: &str = "PEER_HOST_ALIAS";
}

const DEFAULT_PEER_NAME: &str = "peer0.org1.example.com";
const DEFAULT_USER: &str = "User1@org1.example.com";

/// Everything needed to build a session against one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerlinkConfig {
    /// Membership service provider id (default: Org1MSP).
    #[serde(default = "default_msp_id")]
    pub msp_id: String,

    /// Ledger channel name (default: mychannel).
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Chaincode name (default: basic).
    #[serde(default = "default_chaincode_name")]
    pub chaincode_name: String,

    /// Root of the organization's crypto material.
    #[serde(default = "default_crypto_path")]
    pub crypto_path: PathBuf,

    /// Directory holding the member private key (default: derived from `crypto_path`).
    #[serde(default)]
    pub key_directory_path: Option<PathBuf>,

    /// Member certificate (default: derived from `crypto_path`).
    #[serde(default)]
    pub cert_path: Option<PathBuf>,

    /// Peer TLS CA certificate (default: derived from `crypto_path`).
    #[serde(default)]
    pub tls_cert_path: Option<PathBuf>,

    /// Peer `host:port` to dial (default: localhost:7051).
    #[serde(default = "default_peer_endpoint")]
    pub peer_endpoint: String,

    /// Host name checked against the peer certificate (default: peer0.org1.example.com).
    #[serde(default = "default_peer_host_alias")]
    pub peer_host_alias: String,

    /// Key file selection policy.
    #[serde(default)]
    pub key_selection: KeySelection,

    /// Per-operation deadlines.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Per-operation deadlines in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_evaluate_secs")]
    pub evaluate_secs: u64,

    #[serde(default = "default_endorse_secs")]
    pub endorse_secs: u64,

    #[serde(default = "default_submit_secs")]
    pub submit_secs: u64,

    #[serde(default = "default_commit_status_secs")]
    pub commit_status_secs: u64,
}

impl Default for PeerlinkConfig {
    fn default() -> Self {
        Self {
            msp_id: default_msp_id(),
            channel_name: default_channel_name(),
            chaincode_name: default_chaincode_name(),
            crypto_path: default_crypto_path(),
            key_directory_path: None,
            cert_path: None,
            tls_cert_path: None,
            peer_endpoint: default_peer_endpoint(),
            peer_host_alias: default_peer_host_alias(),
            key_selection: KeySelection::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            evaluate_secs: default_evaluate_secs(),
            endorse_secs: default_endorse_secs(),
            submit_secs: default_submit_secs(),
            commit_status_secs: default_commit_status_secs(),
        }
    }
}

impl TimeoutConfig {
    /// Convert to the session's timeout policy
    #[must_use]
    pub const fn policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new()
            .evaluate(Duration::from_secs(self.evaluate_secs))
            .endorse(Duration::from_secs(self.endorse_secs))
            .submit(Duration::from_secs(self.submit_secs))
            .commit_status(Duration::from_secs(self.commit_status_secs))
    }
}

impl PeerlinkConfig {
    /// Load config from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| PeerlinkError::io(path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| PeerlinkError::Config(format!("{}: {e}", path.display())))
    }

    /// Defaults overridden by process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Overlay process environment variables onto this config.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; unset or empty values keep the current setting.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get(env::MSP_ID) {
            self.msp_id = v;
        }
        if let Some(v) = get(env::CHANNEL_NAME) {
            self.channel_name = v;
        }
        if let Some(v) = get(env::CHAINCODE_NAME) {
            self.chaincode_name = v;
        }
        if let Some(v) = get(env::CRYPTO_PATH) {
            self.crypto_path = PathBuf::from(v);
        }
        if let Some(v) = get(env::KEY_DIRECTORY_PATH) {
            self.key_directory_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(env::CERT_PATH) {
            self.cert_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(env::TLS_CERT_PATH) {
            self.tls_cert_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(env::PEER_ENDPOINT) {
            self.peer_endpoint = v;
        }
        if let Some(v) = get(env::PEER_HOST_ALIAS) {
            self.peer_host_alias = v;
        }
        self
    }

    /// Directory holding the member private key
    #[must_use]
    pub fn key_directory_path(&self) -> PathBuf {
        self.key_directory_path.clone().unwrap_or_else(|| {
            self.crypto_path
                .join("users")
                .join(DEFAULT_USER)
                .join("msp")
                .join("keystore")
        })
    }

    /// Member certificate path
    #[must_use]
    pub fn cert_path(&self) -> PathBuf {
        self.cert_path.clone().unwrap_or_else(|| {
            self.crypto_path
                .join("users")
                .join(DEFAULT_USER)
                .join("msp")
                .join("signcerts")
                .join("cert.pem")
        })
    }

    /// Peer TLS CA certificate path
    #[must_use]
    pub fn tls_cert_path(&self) -> PathBuf {
        self.tls_cert_path.clone().unwrap_or_else(|| {
            self.crypto_path
                .join("peers")
                .join(DEFAULT_PEER_NAME)
                .join("tls")
                .join("ca.crt")
        })
    }

    /// Check values that would otherwise only fail deep inside a dial.
    ///
    /// The MSP id is left to identity loading so it keeps its own error kind.
    pub fn validate(&self) -> Result<()> {
        match self.peer_endpoint.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(PeerlinkError::Config(format!(
                    "peer endpoint {:?} is not host:port",
                    self.peer_endpoint
                )))
            }
        }
        if self.peer_host_alias.trim().is_empty() {
            return Err(PeerlinkError::Config("peer host alias must not be empty".into()));
        }
        let t = &self.timeouts;
        if [t.evaluate_secs, t.endorse_secs, t.submit_secs, t.commit_status_secs].contains(&0) {
            return Err(PeerlinkError::Config("timeouts must be at least one second".into()));
        }
        Ok(())
    }
}

// Default value functions for serde.
fn default_msp_id() -> String {
    String::from("Org1MSP")
}

fn default_channel_name() -> String {
    String::from("mychannel")
}

fn default_chaincode_name() -> String {
    String::from("basic")
}

fn default_crypto_path() -> PathBuf {
    ["..", "..", "..", "test-network", "organizations", "peerOrganizations", "org1.example.com"]
        .iter()
        .collect()
}

fn default_peer_endpoint() -> String {
    String::from("localhost:7051")
}

fn default_peer_host_alias() -> String {
    String::from(DEFAULT_PEER_NAME)
}

const fn default_evaluate_secs() -> u64 {
    5
}

const fn default_endorse_secs() -> u64 {
    15
}

const fn default_submit_secs() -> u64 {
    5
}

const fn default_commit_status_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_core::{ErrorKind, OperationKind};
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PeerlinkConfig::default();
        assert_eq!(config.msp_id, "Org1MSP");
        assert_eq!(config.channel_name, "mychannel");
        assert_eq!(config.chaincode_name, "basic");
        assert_eq!(config.peer_endpoint, "localhost:7051");
        assert_eq!(config.peer_host_alias, "peer0.org1.example.com");
        assert_eq!(config.key_selection, KeySelection::FirstByName);
        assert_eq!(config.timeouts.policy(), TimeoutPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_paths() {
        let config = PeerlinkConfig {
            crypto_path: PathBuf::from("/crypto"),
            ..PeerlinkConfig::default()
        };
        assert_eq!(
            config.key_directory_path(),
            PathBuf::from("/crypto/users/User1@org1.example.com/msp/keystore")
        );
        assert_eq!(
            config.cert_path(),
            PathBuf::from("/crypto/users/User1@org1.example.com/msp/signcerts/cert.pem")
        );
        assert_eq!(
            config.tls_cert_path(),
            PathBuf::from("/crypto/peers/peer0.org1.example.com/tls/ca.crt")
        );
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (env::MSP_ID, "Org2MSP"),
            (env::PEER_ENDPOINT, "10.0.0.5:9051"),
            (env::PEER_HOST_ALIAS, "peer0.org2.example.com"),
            (env::KEY_DIRECTORY_PATH, "/keys"),
            (env::CHANNEL_NAME, ""),
        ]
        .into_iter()
        .collect();

        let config = PeerlinkConfig::from_lookup(|name| vars.get(name).map(ToString::to_string));
        assert_eq!(config.msp_id, "Org2MSP");
        assert_eq!(config.peer_endpoint, "10.0.0.5:9051");
        assert_eq!(config.peer_host_alias, "peer0.org2.example.com");
        assert_eq!(config.key_directory_path(), PathBuf::from("/keys"));
        // Empty values fall back to the default
        assert_eq!(config.channel_name, "mychannel");
        assert_eq!(config.chaincode_name, "basic");
    }

    #[test]
    fn test_partial_toml() {
        let config: PeerlinkConfig = toml::from_str(
            r#"
            msp_id = "Org3MSP"
            key_selection = "require-single"

            [timeouts]
            endorse_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.msp_id, "Org3MSP");
        assert_eq!(config.key_selection, KeySelection::RequireSingle);
        let policy = config.timeouts.policy();
        assert_eq!(policy.deadline(OperationKind::Endorse), Duration::from_secs(30));
        assert_eq!(policy.deadline(OperationKind::Evaluate), Duration::from_secs(5));
        assert_eq!(policy.deadline(OperationKind::CommitStatus), Duration::from_secs(60));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = PeerlinkConfig::load(&dir.path().join("peerlink.toml")).unwrap();
        assert_eq!(config, PeerlinkConfig::default());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("peerlink.toml");
        std::fs::write(&path, "msp_id = [").unwrap();
        let err = PeerlinkConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = PeerlinkConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: PeerlinkConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_endpoint = PeerlinkConfig {
            peer_endpoint: "localhost".into(),
            ..PeerlinkConfig::default()
        };
        assert_eq!(bad_endpoint.validate().unwrap_err().kind(), ErrorKind::Config);

        let zero_timeout = PeerlinkConfig {
            timeouts: TimeoutConfig {
                submit_secs: 0,
                ..TimeoutConfig::default()
            },
            ..PeerlinkConfig::default()
        };
        assert_eq!(zero_timeout.validate().unwrap_err().kind(), ErrorKind::Config);

        let blank_alias = PeerlinkConfig {
            peer_host_alias: " ".into(),
            ..PeerlinkConfig::default()
        };
        assert_eq!(blank_alias.validate().unwrap_err().kind(), ErrorKind::Config);
    }
}
