//! Minimal client for OpenAI-compatible chat completions.
//!
//! Docs: <https://platform.openai.com/docs/api-reference/chat/create>

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MemeConfig;
use crate::error::MemeError;

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    /// Model name
    pub model: &'a str,
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Response length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A single chat message.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    /// `user`, `system`, ...
    pub role: &'static str,
    /// Plain text or multimodal parts
    pub content: MessageContent,
}

impl ChatMessage {
    /// A user message made of plain text.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message made of content parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(parts),
        }
    }
}

/// Message content, either a string or a list of parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// Multimodal parts
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text part
    Text {
        /// the text
        text: String,
    },
    /// Image part, usually a `data:` URL
    ImageUrl {
        /// the image reference
        image_url: ImageUrl,
    },
}

/// Image reference inside a content part.
#[derive(Debug, Serialize)]
pub struct ImageUrl {
    /// `https://...` or `data:<mime>;base64,...`
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client, constructed once at startup and shared.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    vision_model: String,
    caption_model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("vision_model", &self.vision_model)
            .field("caption_model", &self.caption_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Builds a client from config.
    pub fn new(http: reqwest::Client, config: &MemeConfig) -> Self {
        Self {
            http,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            vision_model: config.vision_model.clone(),
            caption_model: config.caption_model.clone(),
        }
    }

    /// The model used for image descriptions.
    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    /// The model used for captions.
    pub fn caption_model(&self) -> &str {
        &self.caption_model
    }

    /// Sends one chat completion and returns the first choice's text.
    pub async fn complete(&self, request: &ChatCompletionRequest<'_>) -> Result<String, MemeError> {
        let endpoint = format!("{}/chat/completions", self.base_url);
        debug!("Chat completion request to {} ({})", endpoint, request.model);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).to_string();
            warn!("Chat completion error {}: {}", status, body);
            return Err(MemeError::UpstreamStatus {
                service: "chat completions",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MemeError::InvalidResponse("chat completion had no content".to_string()))
    }
}
