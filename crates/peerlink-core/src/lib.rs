//! Core types for building authenticated ledger peer sessions.
//!
//! This crate holds the data model shared by the peerlink crates:
//!
//! - **Types**: [`CertificateMaterial`], [`Identity`], [`TimeoutPolicy`]
//! - **Errors**: one [`PeerlinkError`] enum whose variants keep every failure category distinct
//!
//! # Example
//!
//! ```rust,ignore
//! use peerlink_core::{CertificateMaterial, Identity, Result};
//!
//! fn member(pem: &[u8]) -> Result<Identity> {
//!     let cert = CertificateMaterial::parse(pem, "cert.pem")?;
//!     Identity::new("Org1MSP", cert)
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/peerlink-core/0.3.0")]

mod error;
pub mod types;

pub use error::{ErrorKind, PeerlinkError, Result};
pub use types::*;
