use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (connection, TLS, DNS, ...).
    Request { source: reqwest::Error },

    /// The endpoint answered with a non-success status.
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The endpoint answered 2xx but the body held no reply text.
    MalformedResponse { detail: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Request { source } => write!(f, "Request failed: {}", source),
            ApiError::Status { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    write!(f, "API request failed with {}", status)
                } else {
                    write!(f, "API request failed with {}: {}", status, body)
                }
            }
            ApiError::MalformedResponse { detail } => {
                write!(f, "API response did not contain a reply: {}", detail)
            }
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Request { source } => Some(source),
            _ => None,
        }
    }
}

/// Client for the chat-completion endpoint. Cheap to clone; every chat
/// submission runs `send` on its own background task.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(config: &Config, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one non-streaming completion request carrying the user's
    /// message and return the extracted reply text.
    pub async fn send(&self, message: &str) -> Result<String, ApiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: message.to_string(),
            }],
            stream: false,
        };

        debug!(model = %self.model, "sending chat completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|source| ApiError::Request { source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Request { source })?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|source| ApiError::MalformedResponse {
                detail: source.to_string(),
            })?;
        extract_reply(parsed)
    }
}

/// Pull the reply text out of a parsed completion response.
pub fn extract_reply(response: ChatResponse) -> Result<String, ApiError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ApiError::MalformedResponse {
            detail: "no reply in response choices".to_string(),
        })
}
