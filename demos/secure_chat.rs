//! End-to-end secure chat call.
//!
//! The API key is read from OPENAI_API_KEY straight into guarded memory,
//! the endpoint is verified before anything is sent, and the response
//! content comes back in a zeroize-on-drop buffer.
//!
//! Usage:
//!   OPENAI_API_KEY=sk-... cargo run --example secure_chat
//!   SECURE_OPENAI_HOST=api.groq.com SECURE_OPENAI_PIN=<hex> ... to override

use secure_openai::{ChatMessage, Credential, EndpointIdentity, SecureClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let credential = Credential::from_env("OPENAI_API_KEY")?;

    let host =
        std::env::var("SECURE_OPENAI_HOST").unwrap_or_else(|_| "api.openai.com".to_string());
    let model = std::env::var("SECURE_OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let mut identity = EndpointIdentity::new(host);
    if let Ok(pin) = std::env::var("SECURE_OPENAI_PIN") {
        identity = identity.with_pin(pin.parse()?);
    }

    let mut client = SecureClient::new(identity, credential);

    println!("Verifying endpoint identity...");
    let endpoint = client.verify().await?;
    println!("Verified. Connections pinned to {}\n", endpoint.pin());

    let messages = vec![
        ChatMessage::system("You are a helpful assistant."),
        ChatMessage::user("In one sentence: why should API clients pin certificates?"),
    ];

    println!("Sending request to the API...");
    let response = client.chat_completion(&model, messages).await?;

    match response.content() {
        Some(content) => println!("\n{}\n", content.as_str()),
        None => println!("API returned no content"),
    }

    if let Some(usage) = response.usage {
        println!("tokens: {} prompt, {} completion", usage.prompt_tokens, usage.completion_tokens);
    }

    Ok(())
}
