//! Ordering and hygiene properties of the secure call path, exercised
//! through instrumented stubs: dispatch never happens before verification,
//! cancellation writes nothing, and no secret ever surfaces in debug output.

use async_trait::async_trait;
use secure_openai::error::TransportError;
use secure_openai::tls::Handshake;
use secure_openai::{
    ChatMessage, ConnectionIdentity, Credential, EndpointIdentity, Error, IdentityError,
    SecretBytes, SecureClient, SecureRequest, SpkiPin, Transport, TransportResponse,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SECRET: &str = "sk-integration-test-secret";

fn pin(byte: u8) -> SpkiPin {
    SpkiPin::from_bytes([byte; 32])
}

fn credential() -> Credential {
    Credential::new(SECRET).unwrap()
}

fn observed(host: &str, p: SpkiPin) -> ConnectionIdentity {
    ConnectionIdentity {
        host: host.into(),
        spki_sha256: p,
    }
}

#[derive(Debug)]
struct RecordedCall {
    url: String,
    has_authorization_header: bool,
    request_debug: String,
}

/// Transport stub that records every dispatch it sees.
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

struct RecordingTransport {
    recorder: Recorder,
    response: &'static str,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn dispatch(
        &self,
        request: SecureRequest,
        _credential: &Credential,
    ) -> Result<TransportResponse, TransportError> {
        self.recorder.calls.lock().unwrap().push(RecordedCall {
            url: request.url().to_string(),
            has_authorization_header: request.headers().contains_key("authorization"),
            request_debug: format!("{:?}", request),
        });
        Ok(TransportResponse::new(
            200,
            SecretBytes::new(self.response.as_bytes().to_vec()),
        ))
    }
}

/// Handshake stub that presents a fixed connection identity.
struct StaticHandshake(ConnectionIdentity);

#[async_trait]
impl Handshake for StaticHandshake {
    async fn observe(&self, _host: &str, _port: u16) -> Result<ConnectionIdentity, TransportError> {
        Ok(self.0.clone())
    }
}

/// Handshake stub that never completes, for cancellation tests.
struct PendingHandshake;

#[async_trait]
impl Handshake for PendingHandshake {
    async fn observe(&self, _host: &str, _port: u16) -> Result<ConnectionIdentity, TransportError> {
        std::future::pending().await
    }
}

fn client_with_recorder(identity: EndpointIdentity) -> (SecureClient, Recorder) {
    let recorder = Recorder::default();
    let transport = RecordingTransport {
        recorder: recorder.clone(),
        response: r#"{"choices": [{"message": {"role": "assistant", "content": "pong"}, "finish_reason": "stop"}]}"#,
    };
    let client = SecureClient::with_transport(identity, credential(), Box::new(transport));
    (client, recorder)
}

#[tokio::test]
async fn dispatch_before_verification_is_rejected() {
    let (mut client, recorder) = client_with_recorder(EndpointIdentity::new("api.example.com"));

    let result = client
        .chat_completion("gpt-4o", vec![ChatMessage::user("hi")])
        .await;

    assert!(matches!(result, Err(Error::NotVerified)));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn pin_mismatch_aborts_before_any_dispatch() {
    let identity = EndpointIdentity::new("api.example.com").with_pin(pin(1));
    let (mut client, recorder) = client_with_recorder(identity);

    let handshake = StaticHandshake(observed("api.example.com", pin(2)));
    let result = client.verify_with(&handshake).await;

    assert!(matches!(
        result,
        Err(Error::Identity(IdentityError::PinMismatch { .. }))
    ));
    assert!(!client.is_verified());

    // A subsequent call must still refuse to dispatch.
    let result = client
        .chat_completion("gpt-4o", vec![ChatMessage::user("hi")])
        .await;
    assert!(matches!(result, Err(Error::NotVerified)));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn host_mismatch_aborts_even_with_matching_pin() {
    let identity = EndpointIdentity::new("api.example.com").with_pin(pin(1));
    let (mut client, recorder) = client_with_recorder(identity);

    let handshake = StaticHandshake(observed("other.example.com", pin(1)));
    let result = client.verify_with(&handshake).await;

    assert!(matches!(
        result,
        Err(Error::Identity(IdentityError::HostMismatch { .. }))
    ));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn cancelled_verification_writes_nothing() {
    let (mut client, recorder) = client_with_recorder(EndpointIdentity::new("api.example.com"));

    let cancelled =
        tokio::time::timeout(Duration::from_millis(20), client.verify_with(&PendingHandshake))
            .await;

    assert!(cancelled.is_err());
    assert!(!client.is_verified());
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn verified_dispatch_never_carries_the_credential_in_the_request() {
    let identity = EndpointIdentity::new("api.example.com").with_pin(pin(1));
    let (mut client, recorder) = client_with_recorder(identity);

    let handshake = StaticHandshake(observed("api.example.com", pin(1)));
    client.verify_with(&handshake).await.unwrap();
    assert!(client.is_verified());

    let response = client
        .chat_completion("gpt-4o", vec![ChatMessage::user("ping")])
        .await
        .unwrap();
    assert_eq!(response.content().unwrap().as_str(), "pong");

    let calls = recorder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];

    assert_eq!(call.url, "https://api.example.com/v1/chat/completions");
    // The request reaches the transport without the credential; injection
    // happens inside the transport, after this point.
    assert!(!call.has_authorization_header);
    assert!(!call.request_debug.contains(SECRET));
}

#[tokio::test]
async fn unpinned_identity_locks_to_first_observed_key() {
    let (mut client, _recorder) = client_with_recorder(EndpointIdentity::new("api.example.com"));

    let handshake = StaticHandshake(observed("api.example.com", pin(42)));
    let endpoint = client.verify_with(&handshake).await.unwrap().clone();

    assert_eq!(*endpoint.pin(), pin(42));
}

#[test]
fn no_secret_in_any_debug_or_error_rendering() {
    let credential = credential();
    assert!(!format!("{:?}", credential).contains(SECRET));

    let message = ChatMessage::user(SECRET);
    assert!(!format!("{:?}", message).contains(SECRET));

    let error = Error::NotVerified;
    assert!(!format!("{:?}", error).contains(SECRET));
    assert!(!error.to_string().contains(SECRET));
}
