/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model backend configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    /// Per-request timeout. Image generation is the slow path.
    pub request_timeout_secs: u64,
}

impl LlmConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                      |
    /// |---------------------------|------------------------------|
    /// | `OPENAI_API_KEY`          | *(required for real calls)*  |
    /// | `OPENAI_BASE_URL`         | `https://api.openai.com/v1`  |
    /// | `OPENAI_TEXT_MODEL`       | `gpt-4.1`                    |
    /// | `OPENAI_IMAGE_MODEL`      | `gpt-image-1`                |
    /// | `OPENAI_TIMEOUT_SECS`     | `300`                        |
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();
        let text_model = std::env::var("OPENAI_TEXT_MODEL").unwrap_or_else(|_| "gpt-4.1".into());
        let image_model =
            std::env::var("OPENAI_IMAGE_MODEL").unwrap_or_else(|_| "gpt-image-1".into());
        let request_timeout_secs: u64 = std::env::var("OPENAI_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("OPENAI_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            base_url,
            text_model,
            image_model,
            request_timeout_secs,
        }
    }
}
