//! TLS fingerprint computation, certificate pinning, and the pre-flight
//! handshake
//!
//! Fingerprints hash the full SPKI (SubjectPublicKeyInfo) DER encoding, not
//! just the raw public key bytes, matching how OpenSSL computes public key
//! fingerprints.

use async_trait::async_trait;
use rustls::pki_types::CertificateDer;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::identity::{ConnectionIdentity, SpkiPin};

/// Compute the SHA-256 fingerprint of a certificate's public key.
pub fn spki_sha256(cert_der: &CertificateDer<'_>) -> Result<SpkiPin, TransportError> {
    use der::{Decode, Encode};
    use x509_cert::Certificate;

    let cert = Certificate::from_der(cert_der.as_ref())
        .map_err(|e| TransportError::Certificate(format!("failed to parse certificate: {}", e)))?;

    // Algorithm identifier + public key bits, as one DER blob
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| TransportError::Certificate(format!("failed to encode SPKI: {}", e)))?;

    let hash = Sha256::digest(&spki_der);
    Ok(SpkiPin::from_bytes(hash.into()))
}

/// Certificate verifier that pins to a specific public key fingerprint.
///
/// Runs standard chain validation (CA signatures, expiry, hostname) first,
/// then requires the server certificate's SPKI fingerprint to equal the
/// pinned value. Both checks must pass on every connection.
#[derive(Debug)]
pub struct PinnedCertVerifier {
    pin: SpkiPin,
    inner: Arc<rustls::client::WebPkiServerVerifier>,
}

impl PinnedCertVerifier {
    pub fn new(pin: SpkiPin) -> Result<Self, TransportError> {
        let root_store = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        let inner = rustls::client::WebPkiServerVerifier::builder(Arc::new(root_store))
            .build()
            .map_err(|e| TransportError::Certificate(format!("failed to build verifier: {}", e)))?;

        Ok(Self { pin, inner })
    }
}

impl rustls::client::danger::ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &rustls::pki_types::ServerName<'_>,
        ocsp_response: &[u8],
        now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;

        let actual = spki_sha256(end_entity)
            .map_err(|e| rustls::Error::General(format!("fingerprint computation failed: {}", e)))?;

        if actual != self.pin {
            return Err(rustls::Error::General(format!(
                "certificate pin mismatch: expected {}, got {}",
                self.pin, actual
            )));
        }

        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Build a reqwest client that rejects any connection whose server
/// certificate does not carry the pinned public key.
pub(crate) fn build_pinned_client(
    pin: SpkiPin,
    timeout: Duration,
) -> Result<reqwest::Client, TransportError> {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let verifier = PinnedCertVerifier::new(pin)?;

    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    let client = reqwest::Client::builder()
        .use_preconfigured_tls(config)
        .timeout(timeout)
        .build()
        .map_err(TransportError::Http)?;

    Ok(client)
}

/// Pre-flight handshake: open a connection and report the identity the
/// server actually presented. Injectable so verification ordering can be
/// exercised against a stub.
#[async_trait]
pub trait Handshake: Send + Sync {
    async fn observe(&self, host: &str, port: u16) -> Result<ConnectionIdentity, TransportError>;
}

/// Production handshake over tokio + rustls with the WebPKI root store.
///
/// Chain and hostname validation happen inside rustls during the handshake;
/// the fingerprint comparison happens afterwards in the verifier gate.
pub struct TlsHandshake;

#[async_trait]
impl Handshake for TlsHandshake {
    async fn observe(&self, host: &str, port: u16) -> Result<ConnectionIdentity, TransportError> {
        use rustls::pki_types::ServerName;
        use tokio::net::TcpStream;
        use tokio_rustls::TlsConnector;

        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| TransportError::Connect {
                host: host.to_string(),
                source,
            })?;

        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let root_store = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let server_name: ServerName<'_> =
            host.to_string()
                .try_into()
                .map_err(|_| TransportError::Handshake {
                    host: host.to_string(),
                    reason: "invalid server name".into(),
                })?;

        let tls_stream =
            connector
                .connect(server_name, stream)
                .await
                .map_err(|e| TransportError::Handshake {
                    host: host.to_string(),
                    reason: e.to_string(),
                })?;

        let (_, conn) = tls_stream.get_ref();
        let certs = conn
            .peer_certificates()
            .ok_or(TransportError::NoPeerCertificate)?;

        let leaf = certs.first().ok_or(TransportError::NoPeerCertificate)?;
        let spki_sha256 = spki_sha256(leaf)?;

        Ok(ConnectionIdentity {
            host: host.to_string(),
            spki_sha256,
        })
    }
}
