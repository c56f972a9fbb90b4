//! Endpoint identity: expected host and certificate pin
//!
//! An [`EndpointIdentity`] is fixed configuration describing who we intend to
//! talk to. A [`ConnectionIdentity`] is what a live connection actually
//! presented. Verification is the comparison of the two, with AND semantics:
//! when both a hostname and a pin are configured, each must pass on its own.

use crate::error::IdentityError;
use base64::Engine;
use std::fmt;
use std::str::FromStr;

/// SHA-256 fingerprint of a certificate's SubjectPublicKeyInfo DER encoding.
///
/// Accepted textual forms are 64 hex characters (OpenSSL style) and the
/// HPKP-style `sha256/<base64>`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SpkiPin([u8; 32]);

impl SpkiPin {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering, matching `openssl x509 -pubkey | openssl dgst -sha256`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for SpkiPin {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = if let Some(b64) = s.strip_prefix("sha256/") {
            base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| IdentityError::MalformedPin(e.to_string()))?
        } else {
            hex::decode(s).map_err(|e| IdentityError::MalformedPin(e.to_string()))?
        };

        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| IdentityError::MalformedPin("pin must be 32 bytes".into()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for SpkiPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SpkiPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpkiPin({})", self.to_hex())
    }
}

/// The endpoint we intend to talk to. Fixed configuration, immutable after
/// construction, safe to share across tasks.
#[derive(Debug, Clone)]
pub struct EndpointIdentity {
    host: String,
    port: u16,
    pin: Option<SpkiPin>,
}

impl EndpointIdentity {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 443,
            pin: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Pin the endpoint to a specific certificate public key.
    pub fn with_pin(mut self, pin: SpkiPin) -> Self {
        self.pin = Some(pin);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pin(&self) -> Option<&SpkiPin> {
        self.pin.as_ref()
    }

    pub fn base_url(&self) -> String {
        if self.port == 443 {
            format!("https://{}", self.host)
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }

    /// Check a live connection's identity against this configuration.
    ///
    /// Hostname is compared case-insensitively. If a pin is configured it
    /// must also match; failing either check aborts the call.
    pub fn matches(&self, observed: &ConnectionIdentity) -> Result<(), IdentityError> {
        if !self.host.eq_ignore_ascii_case(&observed.host) {
            return Err(IdentityError::HostMismatch {
                expected: self.host.clone(),
                actual: observed.host.clone(),
            });
        }

        if let Some(expected) = &self.pin {
            if *expected != observed.spki_sha256 {
                return Err(IdentityError::PinMismatch {
                    expected: expected.to_hex(),
                    actual: observed.spki_sha256.to_hex(),
                });
            }
        }

        Ok(())
    }
}

/// What a live TLS connection actually presented: the host it was opened to
/// and the SPKI fingerprint of the certificate received.
#[derive(Debug, Clone)]
pub struct ConnectionIdentity {
    pub host: String,
    pub spki_sha256: SpkiPin,
}
