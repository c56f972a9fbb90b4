//! Check that certificate pinning actually rejects wrong fingerprints,
//! then print the fingerprint a host really presents.
//!
//! Usage: cargo run --example pin_check [host]

use secure_openai::tls::{Handshake, TlsHandshake};
use secure_openai::{EndpointIdentity, SpkiPin};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "api.openai.com".to_string());

    println!("═══ Certificate Pinning Check: {} ═══\n", host);

    // A deliberately wrong pin must fail verification.
    println!("Test 1: verification with an all-zero pin");
    let wrong_pin = SpkiPin::from_bytes([0u8; 32]);
    let identity = EndpointIdentity::new(host.clone()).with_pin(wrong_pin);

    match secure_openai::verifier::verify_endpoint(&TlsHandshake, &identity).await {
        Ok(_) => {
            println!("   ❌ FAIL: verification succeeded with a wrong pin\n");
        }
        Err(e) => {
            println!("   ✅ PASS: verification rejected");
            println!("   Reason: {}\n", e);
        }
    }

    // Observe the real fingerprint so it can be pinned in configuration.
    println!("Test 2: observing the presented fingerprint");
    match TlsHandshake.observe(&host, 443).await {
        Ok(observed) => {
            println!("   SPKI SHA-256: {}", observed.spki_sha256);
            println!("   Pin it with EndpointIdentity::with_pin(\"{}\".parse()?)", observed.spki_sha256);
        }
        Err(e) => {
            println!("   Could not reach {}: {}", host, e);
        }
    }
}
