//! The seam between pipeline stages and the model provider.

use async_trait::async_trait;

use crate::error::LlmError;

/// A chat request that must be answered with a single JSON object.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Raw model answer to a [`JsonRequest`].
///
/// `content` is returned unparsed: JSON mode is a request, not a guarantee,
/// and callers decide how to treat text that is not a JSON object.
#[derive(Debug, Clone)]
pub struct JsonCompletion {
    pub content: String,
    pub model: String,
    pub usage: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// `WIDTHxHEIGHT`, e.g. `1024x1536`.
    pub size: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub model: String,
    /// Hosted URL, or an inline `data:` URL when only base64 came back.
    pub result_url: Option<String>,
}

/// Text and image generation as used by the pipeline.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete_json(&self, request: &JsonRequest) -> Result<JsonCompletion, LlmError>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, LlmError>;
}
