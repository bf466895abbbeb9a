use serde::Serialize;

use super::CertificateMaterial;
use crate::error::{PeerlinkError, Result};

/// An organization membership identifier bound to a member certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    msp_id: String,
    certificate: CertificateMaterial,
}

impl Identity {
    /// Bind `msp_id` to `certificate`.
    ///
    /// The identifier is otherwise opaque, but it may not be empty or pure
    /// whitespace.
    pub fn new(msp_id: impl Into<String>, certificate: CertificateMaterial) -> Result<Self> {
        let msp_id = msp_id.into();
        if msp_id.trim().is_empty() {
            return Err(PeerlinkError::InvalidOrganizationId {
                value: msp_id,
                reason: "organization id must not be empty".into(),
            });
        }
        Ok(Self {
            msp_id,
            certificate,
        })
    }

    /// Membership service provider id, e.g. `Org1MSP`
    #[must_use]
    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    #[must_use]
    pub const fn certificate(&self) -> &CertificateMaterial {
        &self.certificate
    }

    /// Credential bytes presented to peers: the PEM-encoded certificate.
    #[must_use]
    pub fn credentials(&self) -> Vec<u8> {
        self.certificate.to_pem().into_bytes()
    }
}
