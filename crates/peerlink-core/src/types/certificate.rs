//! Parsed X.509 certificate material.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::{PeerlinkError, Result};

const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_ED25519: &str = "1.3.101.112";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// Public key algorithm of a certificate or private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// ECDSA over NIST P-256
    EcdsaP256,
    /// ECDSA over NIST P-384
    EcdsaP384,
    /// Ed25519
    Ed25519,
    /// RSA (any modulus size)
    Rsa,
    /// Anything else, identified by its algorithm OID
    Other(String),
}

impl KeyAlgorithm {
    /// Upper bound on the encoded signature length produced for this algorithm.
    ///
    /// ECDSA signatures are DER encoded and vary in length; Ed25519 is always 64 bytes.
    #[must_use]
    pub const fn max_signature_len(&self) -> Option<usize> {
        match self {
            Self::EcdsaP256 => Some(72),
            Self::EcdsaP384 => Some(104),
            Self::Ed25519 => Some(64),
            Self::Rsa | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EcdsaP256 => write!(f, "ECDSA P-256"),
            Self::EcdsaP384 => write!(f, "ECDSA P-384"),
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::Rsa => write!(f, "RSA"),
            Self::Other(oid) => write!(f, "unknown ({oid})"),
        }
    }
}

/// An immutable, parsed X.509 certificate.
///
/// Parsing happens once, in [`CertificateMaterial::parse`]; every accessor
/// reads the extracted fields. The raw DER is kept so the certificate can be
/// handed to a TLS stack or serialized into a ledger identity.
#[derive(Clone, Serialize)]
pub struct CertificateMaterial {
    subject: String,
    issuer: String,
    common_name: Option<String>,
    dns_names: Vec<String>,
    serial: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    key_algorithm: KeyAlgorithm,
    #[serde(serialize_with = "serialize_hex")]
    public_key: Vec<u8>,
    fingerprint: String,
    #[serde(skip)]
    der: Vec<u8>,
}

impl CertificateMaterial {
    /// Parse a certificate from PEM text or raw DER.
    ///
    /// The first `CERTIFICATE` block of a PEM input is used. Input without any
    /// PEM armour is treated as DER. `source` names the origin of the bytes in
    /// error messages.
    pub fn parse(bytes: &[u8], source: &str) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(malformed(source, "no certificate data"));
        }

        let blocks = pem::parse_many(bytes).map_err(|e| malformed(source, e))?;
        if blocks.is_empty() {
            return Self::from_der(bytes, source);
        }

        let block = blocks
            .into_iter()
            .find(|p| p.tag() == "CERTIFICATE")
            .ok_or_else(|| malformed(source, "no CERTIFICATE block in PEM data"))?;

        Self::from_der(block.contents(), source)
    }

    /// Parse a single DER-encoded certificate.
    pub fn from_der(der: &[u8], source: &str) -> Result<Self> {
        let (rest, cert) = X509Certificate::from_der(der).map_err(|e| malformed(source, e))?;
        if !rest.is_empty() {
            return Err(malformed(
                source,
                format!("{} trailing bytes after certificate", rest.len()),
            ));
        }

        let spki = cert.public_key();
        let public_key = spki.subject_public_key.data.to_vec();
        let key_algorithm = classify_key(&spki.algorithm.algorithm.to_id_string(), &public_key);

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(String::from);

        let dns_names = cert
            .subject_alternative_name()
            .map_err(|e| malformed(source, e))?
            .map(|ext| {
                ext.value
                    .general_names
                    .iter()
                    .filter_map(|name| match name {
                        GeneralName::DNSName(dns) => Some((*dns).to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let not_before = asn1_to_utc(cert.validity().not_before.timestamp())
            .ok_or_else(|| malformed(source, "notBefore out of range"))?;
        let not_after = asn1_to_utc(cert.validity().not_after.timestamp())
            .ok_or_else(|| malformed(source, "notAfter out of range"))?;

        let subject = cert.subject().to_string();
        let issuer = cert.issuer().to_string();
        let serial = hex::encode(cert.raw_serial());
        let fingerprint = hex::encode(ring::digest::digest(&ring::digest::SHA256, der));

        Ok(Self {
            subject,
            issuer,
            common_name,
            dns_names,
            serial,
            not_before,
            not_after,
            key_algorithm,
            public_key,
            fingerprint,
            der: der.to_vec(),
        })
    }

    /// Distinguished name of the subject, RFC 4514 style
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Distinguished name of the issuer
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// First common name of the subject, if any
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// DNS names from the subject alternative name extension
    #[must_use]
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    /// Serial number, lowercase hex
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns true if `at` falls inside the validity window
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    #[must_use]
    pub const fn key_algorithm(&self) -> &KeyAlgorithm {
        &self.key_algorithm
    }

    /// Subject public key bytes (SEC1 point for EC keys, raw key for Ed25519)
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// SHA-256 fingerprint of the DER encoding, lowercase hex
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Raw DER encoding
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// PEM encoding of the certificate
    #[must_use]
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.der.clone()))
    }
}

impl PartialEq for CertificateMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for CertificateMaterial {}

impl fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("serial", &self.serial)
            .field("key_algorithm", &self.key_algorithm)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

fn classify_key(oid: &str, public_key: &[u8]) -> KeyAlgorithm {
    match oid {
        // Uncompressed (0x04 || X || Y) or compressed (0x02/0x03 || X) points
        OID_EC_PUBLIC_KEY => match public_key.len() {
            65 | 33 => KeyAlgorithm::EcdsaP256,
            97 | 49 => KeyAlgorithm::EcdsaP384,
            _ => KeyAlgorithm::Other(oid.to_string()),
        },
        OID_ED25519 => KeyAlgorithm::Ed25519,
        OID_RSA_ENCRYPTION => KeyAlgorithm::Rsa,
        other => KeyAlgorithm::Other(other.to_string()),
    }
}

fn asn1_to_utc(epoch: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0)
}

fn malformed(source: &str, reason: impl fmt::Display) -> PeerlinkError {
    PeerlinkError::MalformedCertificate {
        path: source.to_string(),
        reason: reason.to_string(),
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
