//! Endpoint verification gate
//!
//! [`check`] is the only way to mint a [`VerifiedEndpoint`], and every
//! transport constructor requires one. Code that dispatches a request on an
//! endpoint that never passed verification does not compile.

use crate::error::{Error, IdentityError, Result};
use crate::identity::{ConnectionIdentity, EndpointIdentity, SpkiPin};
use crate::tls::Handshake;
use tracing::{debug, info};

/// Proof that an endpoint's identity was checked against its configuration.
///
/// Carries the fingerprint the connection presented; when no pin was
/// configured, that observed fingerprint becomes the pin for every later
/// connection, so the endpoint's key cannot silently change mid-session.
#[derive(Debug, Clone)]
pub struct VerifiedEndpoint {
    identity: EndpointIdentity,
    effective_pin: SpkiPin,
}

impl VerifiedEndpoint {
    pub fn host(&self) -> &str {
        self.identity.host()
    }

    /// The pin all subsequent connections are held to.
    pub fn pin(&self) -> &SpkiPin {
        &self.effective_pin
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.identity.base_url(), path)
    }
}

/// Compare an observed connection identity against the configured one.
///
/// Hostname and pin use AND semantics; failing either aborts verification
/// and nothing credential-bearing is ever written to that connection.
pub fn check(
    identity: &EndpointIdentity,
    observed: ConnectionIdentity,
) -> std::result::Result<VerifiedEndpoint, IdentityError> {
    identity.matches(&observed)?;

    debug!(
        host = identity.host(),
        fingerprint = %observed.spki_sha256,
        "endpoint identity verified"
    );

    Ok(VerifiedEndpoint {
        identity: identity.clone(),
        effective_pin: observed.spki_sha256,
    })
}

/// Run the pre-flight handshake and gate the result through [`check`].
pub async fn verify_endpoint(
    handshake: &dyn Handshake,
    identity: &EndpointIdentity,
) -> Result<VerifiedEndpoint> {
    let observed = handshake.observe(identity.host(), identity.port()).await?;
    let endpoint = check(identity, observed).map_err(Error::Identity)?;

    info!(host = endpoint.host(), "endpoint verified, connections pinned");
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(byte: u8) -> SpkiPin {
        SpkiPin::from_bytes([byte; 32])
    }

    #[test]
    fn test_check_mints_endpoint_on_match() {
        let identity = EndpointIdentity::new("api.example.com").with_pin(pin(7));
        let observed = ConnectionIdentity {
            host: "api.example.com".into(),
            spki_sha256: pin(7),
        };
        let endpoint = check(&identity, observed).unwrap();
        assert_eq!(endpoint.host(), "api.example.com");
        assert_eq!(*endpoint.pin(), pin(7));
    }

    #[test]
    fn test_check_rejects_pin_mismatch() {
        let identity = EndpointIdentity::new("api.example.com").with_pin(pin(7));
        let observed = ConnectionIdentity {
            host: "api.example.com".into(),
            spki_sha256: pin(8),
        };
        assert!(matches!(
            check(&identity, observed),
            Err(IdentityError::PinMismatch { .. })
        ));
    }

    #[test]
    fn test_unpinned_identity_adopts_observed_fingerprint() {
        let identity = EndpointIdentity::new("api.example.com");
        let observed = ConnectionIdentity {
            host: "api.example.com".into(),
            spki_sha256: pin(9),
        };
        let endpoint = check(&identity, observed).unwrap();
        assert_eq!(*endpoint.pin(), pin(9));
    }

    #[test]
    fn test_url_for_joins_path() {
        let identity = EndpointIdentity::new("api.example.com");
        let observed = ConnectionIdentity {
            host: "api.example.com".into(),
            spki_sha256: pin(1),
        };
        let endpoint = check(&identity, observed).unwrap();
        assert_eq!(
            endpoint.url_for("/v1/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }
}
