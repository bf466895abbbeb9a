//! Session composition: one channel, one identity, one signer, one timeout policy.

use peerlink_core::{Identity, OperationKind, PeerlinkError, Result, TimeoutPolicy};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::channel::{open_secure_channel, SecureChannel};
use crate::config::PeerlinkConfig;
use crate::signer::{load_signer_with, Signer};
use crate::trust::{load_identity, load_trust_anchor};

/// Pieces collected before a session is composed.
///
/// Every field is required. `timeouts` is optional only so that a caller can
/// see which pieces are still missing; use [`TimeoutPolicy::default`] for the
/// standard deadlines.
#[derive(Debug, Default)]
pub struct SessionParts {
    /// Open TLS channel to the peer
    pub channel: Option<SecureChannel>,
    /// Member identity presented to the peer
    pub identity: Option<Identity>,
    /// Signer holding the member's private key
    pub signer: Option<Signer>,
    /// Per-operation deadlines
    pub timeouts: Option<TimeoutPolicy>,
}

impl SessionParts {
    /// Names of the pieces not yet supplied
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.channel.is_none() {
            missing.push("channel");
        }
        if self.identity.is_none() {
            missing.push("identity");
        }
        if self.signer.is_none() {
            missing.push("signer");
        }
        if self.timeouts.is_none() {
            missing.push("timeouts");
        }
        missing
    }
}

/// A ready-to-use connection context for submitting and evaluating transactions.
///
/// Cloning is cheap; clones share the channel, so closing one closes them all.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    channel: SecureChannel,
    identity: Identity,
    signer: Signer,
    timeouts: TimeoutPolicy,
}

/// Compose a session from its parts without any I/O.
///
/// Fails with [`PeerlinkError::IncompleteSession`] naming every missing part.
pub fn compose_session(parts: SessionParts) -> Result<Session> {
    let missing = parts.missing();
    let SessionParts {
        channel: Some(channel),
        identity: Some(identity),
        signer: Some(signer),
        timeouts: Some(timeouts),
    } = parts
    else {
        return Err(PeerlinkError::IncompleteSession { missing });
    };

    debug!(
        endpoint = channel.endpoint(),
        msp_id = identity.msp_id(),
        "composed session"
    );
    Ok(Session {
        inner: Arc::new(SessionInner {
            channel,
            identity,
            signer,
            timeouts,
        }),
    })
}

impl Session {
    /// Load credentials, dial the peer and compose a session from `config`.
    ///
    /// Identity and signing key are loaded before the dial, so bad credentials
    /// never cost a network round trip.
    pub async fn connect(config: &PeerlinkConfig) -> Result<Self> {
        config.validate()?;

        let (identity, signer) = tokio::try_join!(
            load_identity(&config.msp_id, config.cert_path()),
            load_signer_with(config.key_directory_path(), config.key_selection),
        )?;

        let anchor = load_trust_anchor(config.tls_cert_path()).await?;
        let channel =
            open_secure_channel(&config.peer_endpoint, &anchor, &config.peer_host_alias).await?;

        let session = compose_session(SessionParts {
            channel: Some(channel),
            identity: Some(identity),
            signer: Some(signer),
            timeouts: Some(config.timeouts.policy()),
        })?;

        info!(
            endpoint = %config.peer_endpoint,
            msp_id = %config.msp_id,
            channel = %config.channel_name,
            chaincode = %config.chaincode_name,
            "session ready"
        );
        Ok(session)
    }

    #[must_use]
    pub fn channel(&self) -> &SecureChannel {
        &self.inner.channel
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    #[must_use]
    pub fn signer(&self) -> &Signer {
        &self.inner.signer
    }

    #[must_use]
    pub fn timeouts(&self) -> &TimeoutPolicy {
        &self.inner.timeouts
    }

    /// Deadline to apply to one call of the given kind
    #[must_use]
    pub fn deadline(&self, kind: OperationKind) -> Duration {
        self.inner.timeouts.deadline(kind)
    }

    /// Close the underlying channel. Later calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        self.inner.channel.close().await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("channel", &self.inner.channel)
            .field("msp_id", &self.inner.identity.msp_id())
            .field("signer", &self.inner.signer)
            .field("timeouts", &self.inner.timeouts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_core::{CertificateMaterial, ErrorKind};

    fn identity() -> Identity {
        let key = rcgen::KeyPair::generate().unwrap();
        let cert = rcgen::CertificateParams::new(vec!["User1@org1.example.com".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap();
        let cert = CertificateMaterial::parse(cert.pem().as_bytes(), "cert.pem").unwrap();
        Identity::new("Org1MSP", cert).unwrap()
    }

    fn signer() -> Signer {
        let key = rcgen::KeyPair::generate().unwrap();
        crate::PrivateKeyMaterial::from_pem(key.serialize_pem().as_bytes(), "priv_sk")
            .unwrap()
            .into()
    }

    #[test]
    fn test_empty_parts_report_everything_missing() {
        let err = compose_session(SessionParts::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompleteSession);
        match err {
            PeerlinkError::IncompleteSession { missing } => {
                assert_eq!(missing, vec!["channel", "identity", "signer", "timeouts"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_channel_only() {
        let parts = SessionParts {
            identity: Some(identity()),
            signer: Some(signer()),
            timeouts: Some(TimeoutPolicy::default()),
            ..SessionParts::default()
        };
        assert_eq!(parts.missing(), vec!["channel"]);

        let err = compose_session(parts).unwrap_err();
        assert_eq!(err.to_string(), "incomplete session: missing channel");
    }
}
