//! Brand DNA synthesis from fetched pages.

use adforge_core::brand_dna::BrandDna;
use adforge_llm::{JsonRequest, ModelBackend};

use crate::error::PipelineError;
use crate::fetcher::FetchedPage;
use crate::prompts::{brand_analyzer_user_prompt, SYSTEM_BRAND_ANALYZER};

const ANALYZER_TEMPERATURE: f32 = 0.4;

/// Normalized analyzer result.
#[derive(Debug, Clone)]
pub struct BrandAnalysis {
    pub dna: BrandDna,
    pub model: String,
    pub usage: Option<serde_json::Value>,
}

/// Ask the model for a Brand DNA and normalize it.
///
/// Missing or malformed sections become defaults; only output that is not a
/// JSON object at all is an error.
pub async fn analyze_brand(
    backend: &dyn ModelBackend,
    primary_url: &str,
    pages: &[FetchedPage],
) -> Result<BrandAnalysis, PipelineError> {
    let request = JsonRequest {
        system: SYSTEM_BRAND_ANALYZER.to_string(),
        user: brand_analyzer_user_prompt(primary_url, pages),
        temperature: ANALYZER_TEMPERATURE,
    };
    let completion = backend.complete_json(&request).await?;

    let value: serde_json::Value = serde_json::from_str(&completion.content)
        .map_err(|e| PipelineError::failed(format!("model returned non-JSON output: {e}")))?;
    let dna = BrandDna::from_value(value)
        .map_err(|e| PipelineError::failed(format!("brand DNA did not match schema: {e}")))?;

    Ok(BrandAnalysis {
        dna,
        model: completion.model,
        usage: completion.usage,
    })
}

/// Text the analysis ran on, stored next to the Brand DNA.
pub fn build_corpus(pages: &[FetchedPage]) -> String {
    pages
        .iter()
        .map(|p| {
            format!(
                "URL: {}\nTITLE: {}\nCONTENT:\n{}\n",
                p.url,
                p.title.as_deref().unwrap_or(""),
                p.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}
