//! Minimal client for OpenAI-compatible chat completion APIs.
//!
//! This crate provides a focused client for the `chat/completions`
//! endpoint shape shared by DeepSeek, OpenAI, Mistral and most hosted
//! inference providers. It deliberately exposes a single operation:
//! turn a prompt into text, within bounded limits.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when using the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A chat-completions provider endpoint.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Base URL up to (not including) `/chat/completions`.
    pub base_url: String,

    /// Model identifier to request.
    pub model: String,
}

impl Provider {
    /// DeepSeek's hosted endpoint.
    pub fn deepseek() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
        }
    }

    /// OpenAI's hosted endpoint.
    pub fn openai() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    /// Mistral's hosted endpoint.
    pub fn mistral() -> Self {
        Self {
            base_url: "https://api.mistral.ai/v1".to_string(),
            model: "mistral-small-latest".to_string(),
        }
    }

    /// A custom OpenAI-compatible endpoint.
    pub fn custom(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Override the model for this provider.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::deepseek()
    }
}

/// Bounds applied to a single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLimits {
    /// Maximum tokens in the completion.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.8,
        }
    }
}

/// Chat completions client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    provider: Provider,
    api_key: String,
}

impl Client {
    /// Create a new client for the given provider.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            provider,
            api_key: api_key.into(),
        }
    }

    /// Create a client from the `TEXTGEN_API_KEY` environment variable,
    /// using the default provider.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("TEXTGEN_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(Provider::default(), api_key))
    }

    /// The provider this client talks to.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Send a prompt and return the completion text.
    pub async fn complete(
        &self,
        prompt: &str,
        limits: &GenerationLimits,
    ) -> Result<String, Error> {
        let body = ApiRequest {
            model: self.provider.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: limits.max_tokens,
            temperature: limits.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.provider.base_url))
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message });
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Parse("response contained no choices".to_string()))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: String,
}
