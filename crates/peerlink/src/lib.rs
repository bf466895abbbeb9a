//! Secure session bootstrap for Hyperledger Fabric style ledger peers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use peerlink::{OperationKind, PeerlinkConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> peerlink::Result<()> {
//!     // MSP_ID, PEER_ENDPOINT, TLS_CERT_PATH, ... override the defaults
//!     let config = PeerlinkConfig::from_env();
//!     let session = Session::connect(&config).await?;
//!
//!     println!("Connected as {}", session.identity().msp_id());
//!     println!("Endorse deadline: {:?}", session.deadline(OperationKind::Endorse));
//!
//!     let signature = session.signer().sign(&[0u8; 32])?;
//!     println!("Signature: {} bytes", signature.len());
//!
//!     session.close().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/peerlink/0.3.0")]

// Re-export core types
pub use peerlink_core::*;

// Re-export client
pub use peerlink_client::{
    compose_session, env, load_identity, load_signer, load_signer_with, load_trust_anchor,
    open_secure_channel, KeySelection, PeerlinkConfig, PrivateKeyMaterial, SecureChannel, Session,
    SessionParts, SignDigest, Signer, TimeoutConfig, ALPN_H2,
};

// Re-export runtime for convenience
pub use tokio;
