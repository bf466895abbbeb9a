//! peerlink - ledger peer session checker
//!
//! Loads credentials, dials a peer over TLS and reports what it found.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    peerlink_cli::run().await
}
