//! Chat model endpoints and the reply they produce.

use std::error::Error;
use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};

pub mod openai;

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The reply of a chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Text of the first choice. Empty when the provider returned no content.
    pub content: String,
    /// The model that actually served the request.
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl ChatResponse {
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            finish_reason: None,
            usage: None,
        }
    }
}

/// Error when the provider's reply cannot be turned into a [ChatResponse].
#[derive(Debug, Clone)]
pub struct MalformedResponse {
    pub reason: String,
}

impl fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MalformedResponse: {}", self.reason)
    }
}

impl Error for MalformedResponse {}
