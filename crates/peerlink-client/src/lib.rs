//! Session bootstrap for Hyperledger Fabric style ledger peers.
//!
//! A [`Session`] bundles four things:
//!
//! - a [`SecureChannel`] trusting exactly one CA certificate
//! - an [`Identity`](peerlink_core::Identity) binding an MSP id to a member certificate
//! - a [`Signer`] holding the member's private key
//! - a [`TimeoutPolicy`](peerlink_core::TimeoutPolicy) with per-operation deadlines
//!
//! ```rust,ignore
//! use peerlink_client::{PeerlinkConfig, Session};
//! use peerlink_core::OperationKind;
//!
//! let config = PeerlinkConfig::from_env();
//! let session = Session::connect(&config).await?;
//! let deadline = session.deadline(OperationKind::Endorse);
//! session.close().await?;
//! ```

mod channel;
mod config;
mod session;
mod signer;
mod trust;

pub use channel::{open_secure_channel, SecureChannel, ALPN_H2};
pub use config::{env, PeerlinkConfig, TimeoutConfig};
pub use peerlink_core::{PeerlinkError, Result};
pub use session::{compose_session, Session, SessionParts};
pub use signer::{load_signer, load_signer_with, KeySelection, PrivateKeyMaterial, SignDigest, Signer};
pub use trust::{load_identity, load_trust_anchor};
