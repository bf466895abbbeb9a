//! TLS channel to a ledger peer, trusted through a single CA certificate.

use peerlink_core::{CertificateMaterial, PeerlinkError, Result};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

/// ALPN protocol advertised so the channel can carry gRPC over HTTP/2
pub const ALPN_H2: &[u8] = b"h2";

/// A live TLS connection to one peer endpoint.
///
/// The channel does no RPC work of its own. Consumers borrow the stream with
/// [`SecureChannel::io`]; after [`SecureChannel::close`] every borrow fails
/// with [`PeerlinkError::ChannelClosed`].
pub struct SecureChannel {
    endpoint: String,
    authority: String,
    alpn_protocol: Option<Vec<u8>>,
    peer_certificate: Option<Vec<u8>>,
    stream: Mutex<Option<TlsStream<TcpStream>>>,
    closed: AtomicBool,
}

/// Open a TLS channel to `endpoint` (`host:port`).
///
/// Only certificates chaining to `trust_anchor` are accepted; the system
/// trust store is never consulted. The peer certificate is checked against
/// `hostname_override`, not against the host part of `endpoint`, so the dial
/// address may be an IP, a load balancer or a tunnel.
pub async fn open_secure_channel(
    endpoint: &str,
    trust_anchor: &CertificateMaterial,
    hostname_override: &str,
) -> Result<SecureChannel> {
    let config = client_config(trust_anchor)?;
    let server_name = ServerName::try_from(hostname_override.to_owned()).map_err(|e| {
        PeerlinkError::Config(format!("invalid hostname override {hostname_override:?}: {e}"))
    })?;

    debug!(endpoint, authority = hostname_override, "dialing peer");
    let tcp = TcpStream::connect(endpoint)
        .await
        .map_err(|e| PeerlinkError::Connection {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(endpoint, error = %e, "could not set TCP_NODELAY");
    }

    let tls = TlsConnector::from(Arc::new(config))
        .connect(server_name, tcp)
        .await
        .map_err(|e| classify_handshake_error(e, endpoint, hostname_override))?;

    let (_, session) = tls.get_ref();
    let alpn_protocol = session.alpn_protocol().map(<[u8]>::to_vec);
    let peer_certificate = session
        .peer_certificates()
        .and_then(|chain| chain.first())
        .map(|leaf| leaf.as_ref().to_vec());

    let alpn = alpn_protocol
        .as_deref()
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    info!(
        endpoint,
        authority = hostname_override,
        alpn = %alpn,
        "secure channel established"
    );

    Ok(SecureChannel {
        endpoint: endpoint.to_string(),
        authority: hostname_override.to_string(),
        alpn_protocol,
        peer_certificate,
        stream: Mutex::new(Some(tls)),
        closed: AtomicBool::new(false),
    })
}

impl SecureChannel {
    /// Address that was dialed
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Host name the peer certificate was verified against
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// ALPN protocol selected by the peer, if any
    #[must_use]
    pub fn negotiated_protocol(&self) -> Option<&[u8]> {
        self.alpn_protocol.as_deref()
    }

    /// DER of the leaf certificate the peer presented
    #[must_use]
    pub fn peer_certificate(&self) -> Option<&[u8]> {
        self.peer_certificate.as_deref()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Borrow the underlying TLS stream exclusively.
    ///
    /// Fails with [`PeerlinkError::ChannelClosed`] once the channel is closed.
    pub async fn io(&self) -> Result<MappedMutexGuard<'_, TlsStream<TcpStream>>> {
        let guard = self.stream.lock().await;
        MutexGuard::try_map(guard, Option::as_mut).map_err(|_| self.closed_error())
    }

    /// Close the channel, sending a TLS close_notify to the peer.
    ///
    /// Closing an already closed channel does nothing.
    pub async fn close(&self) -> Result<()> {
        let taken = self.stream.lock().await.take();
        self.closed.store(true, Ordering::Release);

        let Some(mut stream) = taken else {
            debug!(endpoint = %self.endpoint, "channel already closed");
            return Ok(());
        };

        if let Err(e) = stream.shutdown().await {
            // The stream is dropped either way; a failed close_notify only matters to the peer
            warn!(endpoint = %self.endpoint, error = %e, "TLS shutdown did not complete cleanly");
        }
        info!(endpoint = %self.endpoint, "secure channel closed");
        Ok(())
    }

    fn closed_error(&self) -> PeerlinkError {
        PeerlinkError::ChannelClosed {
            endpoint: self.endpoint.clone(),
        }
    }
}

impl fmt::Debug for SecureChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureChannel")
            .field("endpoint", &self.endpoint)
            .field("authority", &self.authority)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn client_config(trust_anchor: &CertificateMaterial) -> Result<ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots
        .add(CertificateDer::from(trust_anchor.der().to_vec()))
        .map_err(|e| PeerlinkError::MalformedCertificate {
            path: trust_anchor.subject().to_string(),
            reason: format!("not usable as a trust anchor: {e}"),
        })?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| PeerlinkError::Config(format!("TLS configuration error: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![ALPN_H2.to_vec()];

    Ok(config)
}

/// Split handshake failures into trust rejections and plain transport failures.
fn classify_handshake_error(err: io::Error, endpoint: &str, authority: &str) -> PeerlinkError {
    let tls_error = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>());

    match tls_error {
        Some(
            e @ (rustls::Error::InvalidCertificate(_)
            | rustls::Error::NoCertificatesPresented
            | rustls::Error::InvalidCertRevocationList(_)),
        ) => PeerlinkError::TrustVerification {
            authority: authority.to_string(),
            reason: e.to_string(),
        },
        Some(e) => PeerlinkError::Connection {
            endpoint: endpoint.to_string(),
            reason: format!("TLS handshake failed: {e}"),
        },
        None => PeerlinkError::Connection {
            endpoint: endpoint.to_string(),
            reason: format!("TLS handshake failed: {err}"),
        },
    }
}
