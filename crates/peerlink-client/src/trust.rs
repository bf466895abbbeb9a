//! Trust anchor and member certificate loading.

use chrono::Utc;
use peerlink_core::{CertificateMaterial, Identity, PeerlinkError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Load the CA certificate that a secure channel will treat as its only trust root.
///
/// Every call reads the file again; callers that want reuse keep the returned value.
pub async fn load_trust_anchor(path: impl AsRef<Path>) -> Result<CertificateMaterial> {
    let path = path.as_ref();
    let anchor = read_certificate(path).await?;

    if !anchor.is_valid_at(Utc::now()) {
        warn!(
            path = %path.display(),
            not_after = %anchor.not_after(),
            "trust anchor is outside its validity window"
        );
    }

    info!(
        path = %path.display(),
        subject = anchor.subject(),
        fingerprint = anchor.fingerprint(),
        "loaded trust anchor"
    );
    Ok(anchor)
}

/// Load a member certificate and bind it to `msp_id`.
pub async fn load_identity(msp_id: &str, certificate_path: impl AsRef<Path>) -> Result<Identity> {
    let path = certificate_path.as_ref();

    // Reject a bad id before touching the filesystem
    if msp_id.trim().is_empty() {
        return Err(PeerlinkError::InvalidOrganizationId {
            value: msp_id.to_string(),
            reason: "organization id must not be empty".into(),
        });
    }

    let certificate = read_certificate(path).await?;
    let identity = Identity::new(msp_id, certificate)?;

    info!(
        msp_id = identity.msp_id(),
        subject = identity.certificate().subject(),
        serial = identity.certificate().serial(),
        "loaded identity"
    );
    Ok(identity)
}

async fn read_certificate(path: &Path) -> Result<CertificateMaterial> {
    let path_str = path.display().to_string();
    debug!(path = %path_str, "reading certificate");

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PeerlinkError::io(&path_str, e))?;

    CertificateMaterial::parse(&bytes, &path_str)
}
