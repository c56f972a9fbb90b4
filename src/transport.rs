//! Transport adapter: the only place the credential meets the wire
//!
//! [`HttpTransport`] can only be constructed from a [`VerifiedEndpoint`], and
//! its reqwest client re-validates the pinned fingerprint on every
//! connection, not just the pre-flight. The [`Transport`] trait is the seam
//! test suites use to instrument dispatch with a recording stub.

use crate::credential::Credential;
use crate::error::TransportError;
use crate::request::SecureRequest;
use crate::secret::SecretBytes;
use crate::tls;
use crate::verifier::VerifiedEndpoint;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroize;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Response as seen at the transport boundary. The body stays in guarded
/// memory until the caller deserializes it.
#[derive(Debug)]
pub struct TransportResponse {
    status: u16,
    body: SecretBytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: SecretBytes) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &SecretBytes {
        &self.body
    }
}

/// Dispatches one request over an already-verified channel.
///
/// The credential crosses this boundary and no earlier one; implementations
/// attach it last, after everything else about the request is fixed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(
        &self,
        request: SecureRequest,
        credential: &Credential,
    ) -> Result<TransportResponse, TransportError>;
}

/// Production transport over a certificate-pinned reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport pinned to the endpoint's verified fingerprint.
    pub fn connect(endpoint: &VerifiedEndpoint) -> Result<Self, TransportError> {
        Self::connect_with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn connect_with_timeout(
        endpoint: &VerifiedEndpoint,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = tls::build_pinned_client(*endpoint.pin(), timeout)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(
        &self,
        request: SecureRequest,
        credential: &Credential,
    ) -> Result<TransportResponse, TransportError> {
        let (method, url, headers, body) = request.into_parts();

        // Credential joins the request here and nowhere else. The scratch
        // string is wiped as soon as the header value exists, and the header
        // is marked sensitive so reqwest never logs it.
        let mut auth = credential.expose(|secret| {
            let mut bearer = format!("Bearer {}", secret);
            let value = HeaderValue::from_str(&bearer);
            bearer.zeroize();
            value.map_err(|_| TransportError::CredentialEncoding)
        })?;
        auth.set_sensitive(true);

        let response = self
            .client
            .request(method, url.as_str())
            .headers(headers)
            .header(AUTHORIZATION, auth)
            .body(body.as_bytes().to_vec())
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        debug!(status, url = %url, "request dispatched");

        Ok(TransportResponse::new(
            status,
            SecretBytes::new(bytes.to_vec()),
        ))
    }
}
