//! Secure client: verification first, dispatch second
//!
//! Every request goes out through a TLS connection that re-validates the
//! pinned certificate fingerprint, and the credential is attached only
//! inside the transport, after verification has succeeded.

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::identity::EndpointIdentity;
use crate::request::SecureRequest;
use crate::tls::{Handshake, TlsHandshake};
use crate::transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
use crate::verifier::{self, VerifiedEndpoint};
use std::time::Duration;
use tracing::warn;

/// Default path for OpenAI-compatible chat completions.
pub const DEFAULT_CHAT_PATH: &str = "/v1/chat/completions";

/// Zero-trust client for an OpenAI-compatible endpoint.
///
/// The client verifies the endpoint on first use:
/// 1. Opens a pre-flight TLS connection through the WebPKI roots
/// 2. Checks the presented certificate against the configured identity
///    (hostname AND pin when both are set)
/// 3. Builds a pinned transport that re-validates the fingerprint on EVERY
///    connection
///
/// Until verification succeeds, any dispatch attempt fails with
/// [`Error::NotVerified`] and nothing is written to the network.
pub struct SecureClient {
    identity: EndpointIdentity,
    credential: Credential,
    chat_path: String,
    timeout: Duration,
    verified: Option<VerifiedEndpoint>,
    transport: Option<Box<dyn Transport>>,
    external_transport: bool,
}

impl SecureClient {
    /// Create a client for the given endpoint identity.
    pub fn new(identity: EndpointIdentity, credential: Credential) -> Self {
        Self {
            identity,
            credential,
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            verified: None,
            transport: None,
            external_transport: false,
        }
    }

    /// Create a client with an externally supplied transport.
    ///
    /// The transport is still gated behind verification; this exists so
    /// instrumented stubs can observe that nothing is dispatched before the
    /// identity check passes.
    pub fn with_transport(
        identity: EndpointIdentity,
        credential: Credential,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            identity,
            credential,
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            verified: None,
            transport: Some(transport),
            external_transport: true,
        }
    }

    /// Override the chat completions path, e.g. `/openai/v1/chat/completions`
    /// for providers that nest the OpenAI surface under a prefix.
    pub fn with_chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    /// Request timeout for the pinned transport. Takes effect at verify time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn identity(&self) -> &EndpointIdentity {
        &self.identity
    }

    pub fn is_verified(&self) -> bool {
        self.verified.is_some() && self.transport.is_some()
    }

    pub fn verified_endpoint(&self) -> Option<&VerifiedEndpoint> {
        self.verified.as_ref()
    }

    /// Verify the endpoint identity and set up the pinned transport.
    pub async fn verify(&mut self) -> Result<&VerifiedEndpoint> {
        self.verify_with(&TlsHandshake).await
    }

    /// Verify using a caller-supplied pre-flight handshake.
    pub async fn verify_with(&mut self, handshake: &dyn Handshake) -> Result<&VerifiedEndpoint> {
        let endpoint = verifier::verify_endpoint(handshake, &self.identity).await?;

        if !self.external_transport {
            let transport = HttpTransport::connect_with_timeout(&endpoint, self.timeout)?;
            self.transport = Some(Box::new(transport));
        }
        self.verified = Some(endpoint);

        Ok(self.verified.as_ref().unwrap())
    }

    async fn ensure_verified(&mut self) -> Result<()> {
        if self.is_verified() {
            return Ok(());
        }
        // An external transport pairs with an external handshake; implicit
        // verification would silently bypass the instrumentation.
        if self.external_transport {
            return Err(Error::NotVerified);
        }
        self.verify().await?;
        Ok(())
    }

    fn transport(&self) -> Result<&dyn Transport> {
        if self.verified.is_none() {
            return Err(Error::NotVerified);
        }
        self.transport.as_deref().ok_or(Error::NotVerified)
    }

    /// Make a chat completion request against the verified endpoint.
    pub async fn chat_completion(
        &mut self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse> {
        self.chat(ChatRequest::new(model, messages)).await
    }

    /// Make a chat completion request with full request options.
    pub async fn chat(&mut self, request: ChatRequest) -> Result<ChatResponse> {
        self.ensure_verified().await?;

        let endpoint = self.verified.as_ref().ok_or(Error::NotVerified)?;
        let url = endpoint.url_for(&self.chat_path);

        let secure = SecureRequest::post(url).json(&request)?.build()?;

        let transport = self.transport()?;
        let response = transport.dispatch(secure, &self.credential).await?;

        if !response.is_success() {
            let status = response.status();
            let message = String::from_utf8_lossy(response.body().as_bytes()).into_owned();
            warn!(status, "API request failed");
            return Err(Error::Api { status, message });
        }

        let chat_response: ChatResponse = serde_json::from_slice(response.body().as_bytes())?;
        Ok(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> EndpointIdentity {
        EndpointIdentity::new("api.example.com")
    }

    fn credential() -> Credential {
        Credential::new("sk-test-key").unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = SecureClient::new(identity(), credential());
        assert_eq!(client.identity().host(), "api.example.com");
        assert!(!client.is_verified());
    }

    #[test]
    fn test_not_verified_error() {
        let client = SecureClient::new(identity(), credential());
        assert!(matches!(client.transport(), Err(Error::NotVerified)));
    }

    #[test]
    fn test_chat_path_override() {
        let client = SecureClient::new(identity(), credential())
            .with_chat_path("/openai/v1/chat/completions");
        assert_eq!(client.chat_path, "/openai/v1/chat/completions");
    }
}
