//! OpenAI-compatible API types
//!
//! Message content rides in [`SecretString`] so prompts and completions get
//! the same memory hygiene as the credential. On the wire these are ordinary
//! OpenAI chat-completion shapes: a message whose content is a single text
//! part serializes as a plain JSON string, anything else as a part array.

use crate::secret::SecretString;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Chat message role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: SecretString,
}

/// One piece of message content.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: SecretString },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<SecretString>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<SecretString>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// A chat message
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(content: impl Into<SecretString>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::text(content)],
        }
    }

    pub fn user(content: impl Into<SecretString>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::text(content)],
        }
    }

    pub fn assistant(content: impl Into<SecretString>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::text(content)],
        }
    }

    /// Multimodal message from explicit parts.
    pub fn with_parts(role: Role, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }
}

// Servers expect plain string content for simple text messages and a part
// array otherwise, so the shape depends on what the message holds.
impl Serialize for ChatMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ChatMessage", 2)?;
        state.serialize_field("role", &self.role)?;

        match self.content.as_slice() {
            [ContentPart::Text { text }] => state.serialize_field("content", text)?,
            parts => state.serialize_field("content", parts)?,
        }

        state.end()
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Content of the first choice, still in guarded memory.
    pub fn content(&self) -> Option<&SecretString> {
        self.choices.first().and_then(|c| c.message.content.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
