use std::time::Duration;

use adforge_core::image_format::{ImageFormat, DEFAULT_IMAGE_FORMATS};
use adforge_core::job::{DEFAULT_LEASE_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS};

/// Queue and stage configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Age after which a `RUNNING` lease is considered abandoned.
    pub lease_timeout: Duration,
    /// Attempt budget for every job this process enqueues.
    pub max_attempts: i32,
    /// Formats requested by the IMAGES job fanned out after generation.
    pub image_formats: Vec<ImageFormat>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lease_timeout: Duration::from_secs(DEFAULT_LEASE_TIMEOUT_SECS as u64),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            image_formats: DEFAULT_IMAGE_FORMATS.to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                                   |
    /// |----------------------|-------------------------------------------|
    /// | `LEASE_TIMEOUT_SECS` | `900`                                     |
    /// | `JOB_MAX_ATTEMPTS`   | `3`                                       |
    /// | `IMAGE_FORMATS`      | `SQUARE_1_1,PORTRAIT_4_5,LANDSCAPE_16_9`  |
    pub fn from_env() -> Self {
        let lease_timeout_secs: u64 = std::env::var("LEASE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_LEASE_TIMEOUT_SECS.to_string())
            .parse()
            .expect("LEASE_TIMEOUT_SECS must be a valid u64");

        let max_attempts: i32 = std::env::var("JOB_MAX_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse()
            .expect("JOB_MAX_ATTEMPTS must be a valid i32");
        assert!(max_attempts >= 1, "JOB_MAX_ATTEMPTS must be at least 1");

        let image_formats = match std::env::var("IMAGE_FORMATS") {
            Ok(raw) => parse_formats(&raw).expect("IMAGE_FORMATS must list known formats"),
            Err(_) => DEFAULT_IMAGE_FORMATS.to_vec(),
        };

        Self {
            lease_timeout: Duration::from_secs(lease_timeout_secs),
            max_attempts,
            image_formats,
        }
    }
}

/// Parse a comma-separated format list, ignoring blanks.
fn parse_formats(raw: &str) -> Result<Vec<ImageFormat>, adforge_core::error::CoreError> {
    let formats = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<ImageFormat>, _>>()?;
    if formats.is_empty() {
        return Err(adforge_core::error::CoreError::Validation(
            "at least one image format is required".into(),
        ));
    }
    Ok(formats)
}
