//! OpenAI-compatible REST client.
//!
//! Uses `/chat/completions` with `response_format: json_object` for text and
//! `/images/generations` for images.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::backend::{GeneratedImage, ImageRequest, JsonCompletion, JsonRequest, ModelBackend};
use crate::config::LlmConfig;
use crate::error::LlmError;

/// HTTP client for an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl ImageData {
    /// Prefer the hosted URL; fall back to an inline PNG data URL.
    fn result_url(self) -> Option<String> {
        self.url
            .or_else(|| self.b64_json.map(|b64| format!("data:image/png;base64,{b64}")))
    }
}

impl OpenAiClient {
    /// Create a client with its own connection pool.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Self::with_client(client, config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Config("OPENAI_API_KEY is not set".into()));
        }
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    // ---- private helpers ----

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, LlmError> {
        let response = self
            .client
            .post(format!("{}{path}", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Returns the response unchanged on success, or an [`LlmError::Api`]
    /// with the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelBackend for OpenAiClient {
    async fn complete_json(&self, request: &JsonRequest) -> Result<JsonCompletion, LlmError> {
        let body = serde_json::json!({
            "model": self.config.text_model,
            "temperature": request.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });

        let response: ChatResponse = self.post_json("/chat/completions", &body).await?;
        tracing::debug!(model = %self.config.text_model, usage = ?response.usage, "Chat completion");

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        Ok(JsonCompletion {
            content,
            model: response.model.unwrap_or_else(|| self.config.text_model.clone()),
            usage: response.usage,
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, LlmError> {
        let body = serde_json::json!({
            "model": self.config.image_model,
            "prompt": request.prompt,
            "size": request.size,
        });

        let response: ImagesResponse = self.post_json("/images/generations", &body).await?;
        let result_url = response
            .data
            .into_iter()
            .next()
            .and_then(ImageData::result_url);

        Ok(GeneratedImage {
            model: self.config.image_model.clone(),
            result_url,
        })
    }
}
