//! Prompt text for the brand analyzer, the creative engine, its repair round
//! and the image stage.

use adforge_core::brand_dna::BrandDna;
use adforge_core::creative::{CreativeType, SchemaViolation};
use adforge_core::image_format::ImageFormat;
use serde::Deserialize;

use crate::fetcher::FetchedPage;

pub const SYSTEM_BRAND_ANALYZER: &str = "\
You are a senior brand strategist and B2B performance marketer.
Your job: extract and infer a structured \"Brand DNA\" from public website text.

Rules:
- Maximize useful, high-signal marketing info (positioning, ICP, offer, proof points).
- Do not invent facts. If something is uncertain, omit it.
- Output MUST be a single JSON object with the sections: version, assets, brand, tone, audience, offer, constraints.
- Keep wording short and reusable for ads.";

pub const SYSTEM_CREATIVE_ENGINE: &str = "\
You are an expert direct-response copywriter and paid ads specialist.
You generate marketing creatives that are consistent with the Brand DNA.

Rules:
- Output MUST be a single JSON object matching the requested shape exactly.
- The root object MUST include the property \"type\" set exactly to the requested creative type.
- Follow the brand tone, preferred and forbidden words, and compliance constraints.
- Avoid fluff; optimize for clarity and conversion.
- Create multiple distinct angles; avoid near-duplicates.";

pub const SYSTEM_REPAIR: &str = "\
You fix JSON documents so they satisfy a schema.
Return ONLY the corrected JSON object. Keep the original copy wherever it is valid;
fill missing required fields with content consistent with the rest of the document.";

/// Upper bound on the page text embedded in the analyzer prompt, per page.
const ANALYZER_PAGE_CHARS: usize = 6_000;

/// Caller-supplied generation parameters. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationParameters {
    pub notes: Option<String>,
    pub creative_count: Option<f64>,
}

impl GenerationParameters {
    /// Lenient decode: anything unreadable means "no parameters".
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Requested item count clamped to `1..=6`.
    pub fn count(&self) -> Option<u32> {
        self.creative_count
            .filter(|n| n.is_finite())
            .map(|n| n.floor().clamp(1.0, 6.0) as u32)
    }
}

pub fn brand_analyzer_user_prompt(primary_url: &str, pages: &[FetchedPage]) -> String {
    let mut prompt = format!(
        "Analyze the following website pages and produce a structured Brand DNA.\n\n\
         Primary URL: {primary_url}\n\nPages:\n"
    );
    for (i, page) in pages.iter().enumerate() {
        let content: String = page.content.chars().take(ANALYZER_PAGE_CHARS).collect();
        prompt.push_str(&format!(
            "\n[{}] URL: {}\nTitle: {}\nContent:\n{}\n",
            i + 1,
            page.url,
            page.title.as_deref().unwrap_or(""),
            content
        ));
    }
    prompt.push_str(
        "\nOutput requirements:\n\
         - Fill ALL core sections: brand, audience, offer, tone, constraints, assets.\n\
         - Prefer brand.name from og:site_name or the page title when present.",
    );
    prompt
}

pub fn creative_engine_user_prompt(
    creative_type: CreativeType,
    brand_dna: &serde_json::Value,
    params: &GenerationParameters,
) -> String {
    let count = params.count();
    let quantity = match (creative_type, count) {
        (CreativeType::MetaAds, n) => format!(
            "Generate {} distinct ads (array \"ads\"), each with a different angle.",
            n.unwrap_or(4)
        ),
        (CreativeType::GoogleAds, n) => format!(
            "Generate {} distinct campaigns (array \"campaigns\"), each with a different angle.",
            n.unwrap_or(4)
        ),
        (_, Some(n)) => format!("Generate at least {n} distinct items/angles for this creative type."),
        (_, None) => "Generate multiple distinct angles for this creative type.".to_string(),
    };

    format!(
        "Generate creatives for the type \"{ty}\".\n\n\
         Your output JSON must have \"type\": \"{ty}\" at the root and exactly this shape:\n{shape}\n\n\
         Quantity requirement:\n{quantity}\n\n\
         Brand DNA (JSON):\n{dna}\n\n\
         Additional notes (optional):\n{notes}",
        ty = creative_type,
        shape = pretty(&creative_type.shape_hint()),
        dna = pretty(brand_dna),
        notes = params.notes.as_deref().unwrap_or(""),
    )
}

/// The single repair request sent after a schema rejection.
pub fn repair_user_prompt(
    creative_type: CreativeType,
    invalid_output: &str,
    violation: &SchemaViolation,
) -> String {
    format!(
        "The following output for creative type \"{ty}\" failed validation.\n\n\
         Validation errors:\n{errors}\n\n\
         Required shape:\n{shape}\n\n\
         Invalid output:\n{invalid_output}\n\n\
         Emit a corrected JSON object with \"type\": \"{ty}\".",
        ty = creative_type,
        errors = violation
            .violations
            .iter()
            .map(|v| format!("- {v}"))
            .collect::<Vec<_>>()
            .join("\n"),
        shape = pretty(&creative_type.shape_hint()),
    )
}

/// Art-direction prompt for one rendered visual.
pub fn build_image_prompt(
    creative_type: CreativeType,
    dna: &BrandDna,
    format: ImageFormat,
) -> String {
    let prefer = dna.tone.words_to_prefer.iter().take(8).cloned().collect::<Vec<_>>().join(", ");
    let avoid = dna.tone.words_to_avoid.iter().take(8).cloned().collect::<Vec<_>>().join(", ");

    format!(
        "Create a high-performing B2B ad image concept for a brand.\n\n\
         Brand: {name}\n\
         Category: {category}\n\
         Value prop: {value_prop}\n\
         Audience: {audience}\n\
         Tone adjectives: {adjectives}\n\
         Preferred words: {prefer}\n\
         Words to avoid: {avoid}\n\n\
         Creative type: {creative_type}\n\
         Format: {format}\n\n\
         Art direction:\n\
         - clean, modern, product-led composition\n\
         - strong contrast and readable hierarchy\n\
         - no logos, no brand names, no watermarks\n\
         - no text baked into the image (copy is overlaid later)\n\n\
         Return a single image matching the direction.",
        name = dna.brand.name,
        category = dna.brand.category,
        value_prop = dna.brand.value_prop,
        audience = dna.audience.icp_summary,
        adjectives = dna.tone.adjectives.join(", "),
    )
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
