//! Error types for the secure client
//!
//! No variant may carry secret material in its message. Fingerprints are not
//! secrets and appear verbatim in mismatch errors to aid diagnosis.

use thiserror::Error;

/// Failures while loading or handling the API secret.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credential source `{0}` is not set")]
    Missing(String),

    #[error("credential is empty")]
    Empty,

    #[error("credential contains bytes that cannot appear in an HTTP header")]
    NotHeaderSafe,
}

/// Endpoint identity verification failures. Fatal for the call; the
/// credential is never transmitted once one of these is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("endpoint host mismatch: expected {expected}, connection presented {actual}")]
    HostMismatch { expected: String, actual: String },

    #[error("certificate pin mismatch: expected {expected}, got {actual}")]
    PinMismatch { expected: String, actual: String },

    #[error("malformed pin: {0}")]
    MalformedPin(String),
}

/// Network-level failures. May be retried by caller policy; this crate never
/// retries on its own.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    #[error("server presented no certificate")]
    NoPeerCertificate,

    #[error("certificate processing failed: {0}")]
    Certificate(String),

    #[error("credential cannot be encoded into a request header")]
    CredentialEncoding,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("endpoint verification failed: {0}")]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("client not verified - call verify() first")]
    NotVerified,

    #[error("request carries a caller-supplied {0} header; the transport owns it")]
    ForbiddenHeader(String),

    #[error("refusing to dispatch to non-https URL")]
    InsecureUrl,

    #[error("API returned no choices")]
    NoChoices,
}

pub type Result<T> = std::result::Result<T, Error>;
