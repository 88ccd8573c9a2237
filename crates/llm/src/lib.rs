//! Client for the generative-model backend.
//!
//! Pipeline stages depend only on the [`ModelBackend`] trait; the
//! OpenAI-compatible REST implementation lives in [`client`].

pub mod backend;
pub mod client;
pub mod config;
pub mod error;

pub use backend::{GeneratedImage, ImageRequest, JsonCompletion, JsonRequest, ModelBackend};
pub use client::OpenAiClient;
pub use config::LlmConfig;
pub use error::LlmError;
