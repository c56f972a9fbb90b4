//! # secure-openai
//!
//! Zero-trust client for OpenAI-compatible APIs. Never trust the transport or
//! the endpoint implicitly; verify explicitly on every call.
//!
//! ## What the client guarantees
//!
//! ### Credential custody
//! - The API key lives in zeroize-on-drop memory from load to teardown
//! - No `Display`, redacted `Debug`, no serialization path
//! - Exposed only through a scoped closure at the transport boundary, and
//!   the Authorization header it lands in is marked sensitive
//!
//! ### Endpoint verification before dispatch
//! - A pre-flight TLS handshake observes the certificate the server actually
//!   presents
//! - Hostname and SPKI pin are checked with AND semantics; failing either
//!   aborts the call before any credential-bearing byte is written
//! - Verification mints a [`VerifiedEndpoint`]; transports cannot be built
//!   without one
//!
//! ## TLS certificate pinning
//!
//! The pinned transport validates connections twice over:
//! - Full WebPKI chain and hostname validation
//! - SPKI SHA-256 fingerprint comparison against the pin, on EVERY
//!   connection, rejecting MITM attempts even with a compromised CA
//!
//! When no pin is configured, the fingerprint observed during the verified
//! pre-flight becomes the pin, so the endpoint's key cannot change silently.
//!
//! ## Example
//!
//! ```rust,ignore
//! use secure_openai::{ChatMessage, Credential, EndpointIdentity, SecureClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credential = Credential::from_env("OPENAI_API_KEY")?;
//!     let identity = EndpointIdentity::new("api.openai.com")
//!         .with_pin("2b70a37cba08a1b15fddb7ba71dec4cb6b91e79c4566c51a7e4c5fb64fd8d8aa".parse()?);
//!
//!     let mut client = SecureClient::new(identity, credential);
//!     client.verify().await?;
//!
//!     let response = client
//!         .chat_completion("gpt-4o", vec![ChatMessage::user("hello")])
//!         .await?;
//!     println!("{}", response.content().map(|c| c.as_str()).unwrap_or(""));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod credential;
pub mod error;
pub mod identity;
pub mod request;
pub mod secret;
pub mod tls;
pub mod transport;
pub mod verifier;

pub use api::{ChatMessage, ChatRequest, ChatResponse, ContentPart, Role};
pub use client::SecureClient;
pub use credential::Credential;
pub use error::{CredentialError, Error, IdentityError, TransportError};
pub use identity::{ConnectionIdentity, EndpointIdentity, SpkiPin};
pub use request::SecureRequest;
pub use secret::{SecretBytes, SecretString};
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use verifier::VerifiedEndpoint;
