pub mod gemini;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

pub use gemini::{GeminiChat, GeminiClient};

/// Transport and provider level failures from the generation service
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Cannot connect to generation service: {0}")]
    ConnectionFailed(String),

    #[error("Generation service response timeout")]
    Timeout,

    #[error("Invalid or expired API key: {0}")]
    AuthFailed(String),

    #[error("Generation service error: {0}")]
    Api(String),

    #[error("Unreadable response from generation service: {0}")]
    InvalidEnvelope(String),

    #[error("Request did not finish: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_connect() {
            GenerationError::ConnectionFailed(err.to_string())
        } else {
            GenerationError::Api(err.to_string())
        }
    }
}

/// One piece of an outgoing user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    /// Base64 encoded binary payload
    InlineData { mime_type: String, data: String },
}

impl MessagePart {
    pub fn inline_data(mime_type: &str, bytes: &[u8]) -> Self {
        MessagePart::InlineData {
            mime_type: mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Settings fixed for the lifetime of a chat session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub system_instruction: String,
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

/// A remote conversational context. Each successful exchange is remembered so
/// follow-up messages are interpreted against everything said before.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Send one user message and return the raw reply text (possibly empty)
    async fn send_message(&mut self, parts: Vec<MessagePart>) -> Result<String, GenerationError>;
}

/// Something that can open chat sessions against a generation service
pub trait GenerationClient: Send + Sync {
    fn start_chat(&self, config: SessionConfig) -> Box<dyn ChatSession>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_is_base64() {
        let part = MessagePart::inline_data("image/png", b"hello");
        assert_eq!(
            part,
            MessagePart::InlineData {
                mime_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
            }
        );
    }

    #[test]
    fn test_error_messages() {
        assert!(GenerationError::Timeout.to_string().contains("timeout"));
        let err = GenerationError::AuthFailed("API key not valid".to_string());
        assert!(err.to_string().contains("API key not valid"));
    }
}
