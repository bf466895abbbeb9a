//! End-to-end session bootstrap against a local TLS peer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use peerlink_client::{
    compose_session, load_identity, load_signer, load_trust_anchor, open_secure_channel,
    PeerlinkConfig, Session, SessionParts, ALPN_H2,
};
use peerlink_core::{ErrorKind, OperationKind, PeerlinkError, TimeoutPolicy};
use rcgen::{CertificateParams, DnType, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

const PEER_NAME: &str = "peer0.org1.example.com";

struct TestCa {
    cert: rcgen::Certificate,
    key: KeyPair,
}

impl TestCa {
    fn new(name: &str) -> Self {
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    fn issue(&self, name: &str) -> (rcgen::Certificate, KeyPair) {
        let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        (cert, key)
    }
}

/// Crypto material laid out like a Fabric organization directory.
struct Org {
    dir: TempDir,
    tls_ca: TestCa,
}

impl Org {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let tls_ca = TestCa::new("tlsca.org1.example.com");
        std::fs::write(dir.path().join("ca.crt"), tls_ca.cert.pem()).unwrap();

        let member_ca = TestCa::new("ca.org1.example.com");
        let (member, member_key) = member_ca.issue("User1@org1.example.com");
        std::fs::write(dir.path().join("cert.pem"), member.pem()).unwrap();

        let keystore = dir.path().join("keystore");
        std::fs::create_dir(&keystore).unwrap();
        std::fs::write(keystore.join("priv_sk"), member_key.serialize_pem()).unwrap();

        Self { dir, tls_ca }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, addr: SocketAddr, alias: &str) -> PeerlinkConfig {
        PeerlinkConfig {
            crypto_path: self.dir.path().to_path_buf(),
            key_directory_path: Some(self.path("keystore")),
            cert_path: Some(self.path("cert.pem")),
            tls_cert_path: Some(self.path("ca.crt")),
            peer_endpoint: addr.to_string(),
            peer_host_alias: alias.to_string(),
            ..PeerlinkConfig::default()
        }
    }
}

/// Start a TLS echo peer presenting a certificate for `name` issued by `ca`.
async fn spawn_peer(ca: &TestCa, name: &str) -> SocketAddr {
    let (cert, key) = ca.issue(name);
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![CertificateDer::from(cert.der().to_vec())],
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
        )
        .unwrap();
    config.alpn_protocols = vec![ALPN_H2.to_vec()];
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((tcp, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let mut buf = [0u8; 256];
                while let Ok(n) = tls.read(&mut buf).await {
                    if n == 0 || tls.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    addr
}

#[tokio::test]
async fn test_connect_end_to_end() {
    let org = Org::new();
    let addr = spawn_peer(&org.tls_ca, PEER_NAME).await;

    let session = Session::connect(&org.config(addr, PEER_NAME)).await.unwrap();

    assert_eq!(session.identity().msp_id(), "Org1MSP");
    assert_eq!(session.channel().authority(), PEER_NAME);
    assert_eq!(session.channel().negotiated_protocol(), Some(ALPN_H2));
    assert!(session.channel().peer_certificate().is_some());
    assert_eq!(session.deadline(OperationKind::Evaluate), Duration::from_secs(5));
    assert_eq!(session.deadline(OperationKind::Endorse), Duration::from_secs(15));
    assert_eq!(session.deadline(OperationKind::Submit), Duration::from_secs(5));
    assert_eq!(session.deadline(OperationKind::CommitStatus), Duration::from_secs(60));

    // The signer holds the key matching the member certificate
    let digest = [0x11u8; 32];
    let signature = session.signer().sign(&digest).unwrap();
    let verifier =
        p256::ecdsa::VerifyingKey::from_sec1_bytes(session.identity().certificate().public_key())
            .unwrap();
    let signature = p256::ecdsa::Signature::from_der(&signature).unwrap();
    verifier.verify_prehash(&digest, &signature).unwrap();

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_channel_carries_bytes_until_closed() {
    let org = Org::new();
    let addr = spawn_peer(&org.tls_ca, PEER_NAME).await;
    let anchor = load_trust_anchor(org.path("ca.crt")).await.unwrap();

    let channel = open_secure_channel(&addr.to_string(), &anchor, PEER_NAME)
        .await
        .unwrap();
    {
        let mut io = channel.io().await.unwrap();
        io.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        io.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    channel.close().await.unwrap();
    assert!(channel.is_closed());
    let err = channel.io().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChannelClosed);

    // Second close is a no-op
    channel.close().await.unwrap();
}

#[tokio::test]
async fn test_untrusted_root_is_rejected() {
    let org = Org::new();
    let rogue = TestCa::new("rogue CA");
    let addr = spawn_peer(&rogue, PEER_NAME).await;

    let err = Session::connect(&org.config(addr, PEER_NAME))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrustVerification);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_override_checked_instead_of_dial_address() {
    let org = Org::new();
    let addr = spawn_peer(&org.tls_ca, PEER_NAME).await;

    // Dialing 127.0.0.1 succeeds because the certificate names the override
    let anchor = load_trust_anchor(org.path("ca.crt")).await.unwrap();
    let channel = open_secure_channel(&addr.to_string(), &anchor, PEER_NAME)
        .await
        .unwrap();
    assert_eq!(channel.endpoint(), addr.to_string());
    channel.close().await.unwrap();

    // Neither the dial address nor this override appears in the certificate
    let err = open_secure_channel(&addr.to_string(), &anchor, "peer1.org1.example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrustVerification);
}

#[tokio::test]
async fn test_empty_key_directory_fails_before_dial() {
    let org = Org::new();
    std::fs::remove_file(org.path("keystore").join("priv_sk")).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let err = Session::connect(&org.config(addr, PEER_NAME))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyKeyDirectory);
    assert!(err.is_credential_error());

    let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "no connection should have been attempted");
}

#[tokio::test]
async fn test_session_clones_share_channel() {
    let org = Org::new();
    let addr = spawn_peer(&org.tls_ca, PEER_NAME).await;
    let session = Session::connect(&org.config(addr, PEER_NAME)).await.unwrap();

    let clone = session.clone();
    clone.close().await.unwrap();
    assert!(session.channel().is_closed());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_compose_from_loaded_parts() {
    let org = Org::new();
    let addr = spawn_peer(&org.tls_ca, PEER_NAME).await;

    let anchor = load_trust_anchor(org.path("ca.crt")).await.unwrap();
    let identity = load_identity("Org1MSP", org.path("cert.pem")).await.unwrap();
    let signer = load_signer(org.path("keystore")).await.unwrap();
    let channel = open_secure_channel(&addr.to_string(), &anchor, PEER_NAME)
        .await
        .unwrap();

    let policy = TimeoutPolicy::default().endorse(Duration::from_secs(30));
    let session = compose_session(SessionParts {
        channel: Some(channel),
        identity: Some(identity),
        signer: Some(signer),
        timeouts: Some(policy),
    })
    .unwrap();
    assert_eq!(session.deadline(OperationKind::Endorse), Duration::from_secs(30));

    // Without a signer the same parts are refused
    let err = compose_session(SessionParts {
        identity: Some(session.identity().clone()),
        timeouts: Some(policy),
        ..SessionParts::default()
    })
    .unwrap_err();
    match err {
        PeerlinkError::IncompleteSession { missing } => {
            assert_eq!(missing, vec!["channel", "signer"]);
        }
        other => panic!("unexpected error: {other}"),
    }

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_trust_anchor_file() {
    let org = Org::new();
    std::fs::remove_file(org.path("ca.crt")).unwrap();
    let addr: SocketAddr = "127.0.0.1:7051".parse().unwrap();

    let err = Session::connect(&org.config(addr, PEER_NAME))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains(&path_str(&org.path("ca.crt"))));
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}
