//! Creative generation with strict acceptance and a single repair round.
//!
//! At most two model calls per run: the generation call and, if its output
//! is rejected, one repair call. A rejected repair fails the run.

use adforge_core::creative::{ensure_tag, validate, CreativeOutput, CreativeType, SchemaViolation};
use adforge_llm::{JsonRequest, ModelBackend};

use crate::error::PipelineError;
use crate::prompts::{
    creative_engine_user_prompt, repair_user_prompt, GenerationParameters, SYSTEM_CREATIVE_ENGINE,
    SYSTEM_REPAIR,
};

const GENERATION_TEMPERATURE: f32 = 0.8;
const REPAIR_TEMPERATURE: f32 = 0.2;

/// Accepted creative output plus model bookkeeping.
#[derive(Debug, Clone)]
pub struct CreativeResult {
    pub output: CreativeOutput,
    pub model: String,
    pub usage: Option<serde_json::Value>,
    /// Whether the repair round produced the accepted output.
    pub repaired: bool,
}

pub async fn generate_creatives(
    backend: &dyn ModelBackend,
    creative_type: CreativeType,
    brand_dna: &serde_json::Value,
    params: &GenerationParameters,
) -> Result<CreativeResult, PipelineError> {
    let request = JsonRequest {
        system: SYSTEM_CREATIVE_ENGINE.to_string(),
        user: creative_engine_user_prompt(creative_type, brand_dna, params),
        temperature: GENERATION_TEMPERATURE,
    };
    let first = backend.complete_json(&request).await?;

    let violation = match accept(&first.content, creative_type) {
        Ok(output) => {
            return Ok(CreativeResult {
                output,
                model: first.model,
                usage: first.usage,
                repaired: false,
            })
        }
        Err(violation) => violation,
    };

    tracing::warn!(
        creative_type = %creative_type,
        error = %violation,
        "Creative output rejected, requesting repair",
    );

    let repair = JsonRequest {
        system: SYSTEM_REPAIR.to_string(),
        user: repair_user_prompt(creative_type, &first.content, &violation),
        temperature: REPAIR_TEMPERATURE,
    };
    let second = backend.complete_json(&repair).await?;
    let output = accept(&second.content, creative_type)?;

    Ok(CreativeResult {
        output,
        model: second.model,
        usage: Some(serde_json::json!({
            "generation": first.usage,
            "repair": second.usage,
        })),
        repaired: true,
    })
}

/// Parse, force the tag, validate.
fn accept(content: &str, creative_type: CreativeType) -> Result<CreativeOutput, SchemaViolation> {
    let mut value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| SchemaViolation {
            creative_type,
            violations: vec![format!("output is not valid JSON: {e}")],
        })?;
    if ensure_tag(&mut value, creative_type) {
        tracing::debug!(creative_type = %creative_type, "Injected creative type tag");
    }
    validate(&value, creative_type)
}
