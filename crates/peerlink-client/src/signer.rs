//! Private key loading and digest signing.

use p256::ecdsa::signature::hazmat::PrehashSigner;
use peerlink_core::{KeyAlgorithm, PeerlinkError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// PEM tags accepted for private keys
const PKCS8_TAG: &str = "PRIVATE KEY";
const SEC1_TAG: &str = "EC PRIVATE KEY";

/// How to pick a key file when the key directory holds more than one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeySelection {
    /// Use the first candidate in file name order
    #[default]
    FirstByName,
    /// Fail unless exactly one candidate exists
    RequireSingle,
}

/// Something that can sign a digest.
///
/// [`PrivateKeyMaterial`] is the in-process implementation; hardware-backed
/// keys can implement this trait and be wrapped with [`Signer::new`].
pub trait SignDigest: Send + Sync {
    /// Sign `digest`, returning the encoded signature
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>>;

    /// Algorithm of the underlying key
    fn algorithm(&self) -> KeyAlgorithm;
}

enum KeyInner {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// An immutable private key parsed from PEM.
pub struct PrivateKeyMaterial {
    key: KeyInner,
    source: PathBuf,
}

impl PrivateKeyMaterial {
    /// Parse a private key from PEM.
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`) for P-256, P-384 and Ed25519, and SEC1
    /// (`EC PRIVATE KEY`) for the two NIST curves. Other PEM blocks in the
    /// input, such as `EC PARAMETERS`, are skipped.
    pub fn from_pem(bytes: &[u8], source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let invalid = |reason: String| PeerlinkError::InvalidKey {
            path: source.display().to_string(),
            reason,
        };

        let blocks = pem::parse_many(bytes).map_err(|e| invalid(e.to_string()))?;
        let block = blocks
            .iter()
            .find(|p| matches!(p.tag(), PKCS8_TAG | SEC1_TAG))
            .ok_or_else(|| invalid("no PRIVATE KEY or EC PRIVATE KEY block".into()))?;

        let der = block.contents();
        let key = if block.tag() == PKCS8_TAG {
            decode_pkcs8(der)
        } else {
            decode_sec1(der)
        }
        .ok_or_else(|| invalid(format!("unsupported or corrupt {} encoding", block.tag())))?;

        Ok(Self { key, source })
    }

    /// File the key was read from
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Public half of the key: uncompressed SEC1 point for ECDSA, raw bytes for Ed25519.
    ///
    /// Comparable with [`peerlink_core::CertificateMaterial::public_key`] when a
    /// caller wants to check that a key and certificate belong together.
    #[must_use]
    pub fn public_key(&self) -> Vec<u8> {
        match &self.key {
            KeyInner::P256(k) => k.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            KeyInner::P384(k) => k.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            KeyInner::Ed25519(k) => k.verifying_key().to_bytes().to_vec(),
        }
    }
}

impl SignDigest for PrivateKeyMaterial {
    /// ECDSA keys sign `digest` as a prehash and return a low-S, DER-encoded
    /// signature. Ed25519 keys sign the bytes as given and return 64 raw bytes.
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>> {
        let failed = |e: &dyn fmt::Display| PeerlinkError::Signing(format!("{}: {e}", self.algorithm()));

        match &self.key {
            KeyInner::P256(k) => {
                let sig: p256::ecdsa::Signature = k.sign_prehash(digest).map_err(|e| failed(&e))?;
                let sig = sig.normalize_s().unwrap_or(sig);
                Ok(sig.to_der().as_bytes().to_vec())
            }
            KeyInner::P384(k) => {
                let sig: p384::ecdsa::Signature = k.sign_prehash(digest).map_err(|e| failed(&e))?;
                let sig = sig.normalize_s().unwrap_or(sig);
                Ok(sig.to_der().as_bytes().to_vec())
            }
            KeyInner::Ed25519(k) => {
                let sig = ed25519_dalek::Signer::try_sign(k, digest).map_err(|e| failed(&e))?;
                Ok(sig.to_bytes().to_vec())
            }
        }
    }

    fn algorithm(&self) -> KeyAlgorithm {
        match self.key {
            KeyInner::P256(_) => KeyAlgorithm::EcdsaP256,
            KeyInner::P384(_) => KeyAlgorithm::EcdsaP384,
            KeyInner::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("algorithm", &self.algorithm())
            .field("source", &self.source)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn decode_pkcs8(der: &[u8]) -> Option<KeyInner> {
    use p256::pkcs8::DecodePrivateKey as _;

    if let Ok(k) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
        return Some(KeyInner::P256(k));
    }
    if let Ok(k) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
        return Some(KeyInner::P384(k));
    }
    ed25519_dalek::SigningKey::from_pkcs8_der(der)
        .ok()
        .map(KeyInner::Ed25519)
}

fn decode_sec1(der: &[u8]) -> Option<KeyInner> {
    if let Ok(k) = p256::SecretKey::from_sec1_der(der) {
        return Some(KeyInner::P256(k.into()));
    }
    p384::SecretKey::from_sec1_der(der)
        .ok()
        .map(|k| KeyInner::P384(k.into()))
}

/// Signing capability handed to a session.
///
/// Cloning is cheap and clones share the same key. The key is never mutated,
/// so `sign` may be called from any number of threads at once.
#[derive(Clone)]
pub struct Signer {
    inner: Arc<dyn SignDigest>,
}

impl Signer {
    /// Wrap any digest signer
    pub fn new(signer: impl SignDigest + 'static) -> Self {
        Self {
            inner: Arc::new(signer),
        }
    }

    /// Sign `digest` with the held key
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>> {
        self.inner.sign(digest)
    }

    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.inner.algorithm()
    }
}

impl From<PrivateKeyMaterial> for Signer {
    fn from(key: PrivateKeyMaterial) -> Self {
        Self::new(key)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// Load a signer from the first key file in `key_dir`.
pub async fn load_signer(key_dir: impl AsRef<Path>) -> Result<Signer> {
    load_signer_with(key_dir, KeySelection::default()).await
}

/// Load a signer from `key_dir` using an explicit selection policy.
///
/// Candidates are regular files (symlinks are followed) whose names do not
/// start with a dot, ordered by file name so the choice does not depend on
/// the storage backend's listing order.
pub async fn load_signer_with(key_dir: impl AsRef<Path>, selection: KeySelection) -> Result<Signer> {
    let key_path = select_key_file(key_dir.as_ref(), selection).await?;
    let path_str = key_path.display().to_string();

    let bytes = tokio::fs::read(&key_path)
        .await
        .map_err(|e| PeerlinkError::io(&path_str, e))?;
    let key = PrivateKeyMaterial::from_pem(&bytes, &key_path)?;

    info!(path = %path_str, algorithm = %key.algorithm(), "loaded signing key");
    Ok(Signer::from(key))
}

async fn select_key_file(dir: &Path, selection: KeySelection) -> Result<PathBuf> {
    let dir_str = dir.display().to_string();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PeerlinkError::io(&dir_str, e))?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PeerlinkError::io(&dir_str, e))?
    {
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            debug!(path = %path.display(), "skipping hidden entry");
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => candidates.push(path),
            Ok(_) => {}
            // Dangling symlinks and unreadable entries are not candidates
            Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable entry"),
        }
    }

    candidates.sort();

    match (candidates.len(), selection) {
        (0, _) => Err(PeerlinkError::EmptyKeyDirectory { path: dir_str }),
        (1, _) => Ok(candidates.swap_remove(0)),
        (count, KeySelection::RequireSingle) => {
            Err(PeerlinkError::AmbiguousKeyDirectory { path: dir_str, count })
        }
        (count, KeySelection::FirstByName) => {
            let chosen = candidates.swap_remove(0);
            warn!(
                path = %dir_str,
                count,
                chosen = %chosen.display(),
                "key directory holds several files, using the first by name"
            );
            Ok(chosen)
        }
    }
}
