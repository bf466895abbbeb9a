//! # peerlink-cli
//!
//! Command-line front end for the `peerlink` session bootstrap.
//!
//! ## Features
//!
//! - **check**: build a full session from config and environment, then close it
//! - **inspect**: print the details of a certificate file
//! - **sign**: sign a hex digest with a key from a keystore directory
//! - **config**: show the effective configuration
//! - **Output formats**: pretty text or JSON

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
