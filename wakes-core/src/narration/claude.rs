//! Narrator backed by the Anthropic Messages API.

use super::{NarrationOptions, Narrator};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Errors from the narration provider.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("API key not configured - set ANTHROPIC_API_KEY")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Claude Messages API narrator.
#[derive(Clone)]
pub struct ClaudeNarrator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for ClaudeNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeNarrator")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ClaudeNarrator {
    pub fn new(api_key: impl Into<String>) -> Result<Self, NarrationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NarrationError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create a narrator from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, NarrationError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| NarrationError::NoApiKey)?;
        if api_key.trim().is_empty() {
            return Err(NarrationError::NoApiKey);
        }
        Self::new(api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One non-streaming completion, returning the concatenated text blocks.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        options: &NarrationOptions,
    ) -> Result<String, NarrationError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            system: (!system.is_empty()).then_some(system),
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(format!("{API_BASE}/messages"))
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NarrationError::Api { status, message });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::Parse(e.to_string()))?;

        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ApiContent::Text { text } => Some(text),
                ApiContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(NarrationError::Parse("response had no text".to_string()));
        }
        Ok(text)
    }

    fn build_headers(&self) -> Result<HeaderMap, NarrationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| NarrationError::NoApiKey)?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

#[async_trait]
impl Narrator for ClaudeNarrator {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: &NarrationOptions,
    ) -> Option<String> {
        match self.complete(system, prompt, options).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "narration failed, using fallback");
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
