//! Closed, tag-discriminated schema for generated creatives.
//!
//! Every generation run requests exactly one [`CreativeType`]; the model must
//! answer with the matching [`CreativeOutput`] variant, selected by the `type`
//! field. Acceptance is two-step: serde decodes the shape (all fields
//! required), then [`CreativeOutput::violations`] checks the constraints
//! serde cannot express (non-empty strings, minimum array lengths).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;

/// Name of the discriminator field in model output.
pub const TAG_FIELD: &str = "type";

// ---------------------------------------------------------------------------
// Creative type
// ---------------------------------------------------------------------------

/// The seven creative kinds a generation run can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreativeType {
    MetaAds,
    GoogleAds,
    TiktokHooks,
    MarketingEmail,
    SocialPosts,
    AnglesHooksHeadlines,
    AbVariants,
}

impl CreativeType {
    pub const ALL: [CreativeType; 7] = [
        CreativeType::MetaAds,
        CreativeType::GoogleAds,
        CreativeType::TiktokHooks,
        CreativeType::MarketingEmail,
        CreativeType::SocialPosts,
        CreativeType::AnglesHooksHeadlines,
        CreativeType::AbVariants,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CreativeType::MetaAds => "META_ADS",
            CreativeType::GoogleAds => "GOOGLE_ADS",
            CreativeType::TiktokHooks => "TIKTOK_HOOKS",
            CreativeType::MarketingEmail => "MARKETING_EMAIL",
            CreativeType::SocialPosts => "SOCIAL_POSTS",
            CreativeType::AnglesHooksHeadlines => "ANGLES_HOOKS_HEADLINES",
            CreativeType::AbVariants => "AB_VARIANTS",
        }
    }

    /// A minimal instance of the required shape, used in prompts so the model
    /// sees the exact field names and nesting it must produce.
    pub fn shape_hint(self) -> Value {
        match self {
            CreativeType::MetaAds => json!({
                "type": "META_ADS",
                "ads": [{
                    "angle": "string",
                    "audienceSegment": "string",
                    "primaryText": "string",
                    "headline": "string",
                    "description": "string",
                    "cta": "string"
                }]
            }),
            CreativeType::GoogleAds => json!({
                "type": "GOOGLE_ADS",
                "campaigns": [{
                    "angle": "string",
                    "headlines": ["string"],
                    "descriptions": ["string"],
                    "keywords": ["string"]
                }]
            }),
            CreativeType::TiktokHooks => json!({
                "type": "TIKTOK_HOOKS",
                "hooks": [{
                    "angle": "string",
                    "hook": "string",
                    "onScreenText": "string",
                    "voiceover": "string",
                    "shotList": ["string"]
                }]
            }),
            CreativeType::MarketingEmail => json!({
                "type": "MARKETING_EMAIL",
                "email": {
                    "angle": "string",
                    "subjectLines": ["string"],
                    "previewText": "string",
                    "bodyMarkdown": "string"
                }
            }),
            CreativeType::SocialPosts => json!({
                "type": "SOCIAL_POSTS",
                "posts": [{
                    "platform": "linkedin | x | instagram",
                    "angle": "string",
                    "post": "string",
                    "hashtags": ["string"]
                }]
            }),
            CreativeType::AnglesHooksHeadlines => json!({
                "type": "ANGLES_HOOKS_HEADLINES",
                "angles": ["string"],
                "hooks": ["string"],
                "headlines": ["string"]
            }),
            CreativeType::AbVariants => json!({
                "type": "AB_VARIANTS",
                "variants": [{
                    "angle": "string",
                    "a": {"headline": "string", "primaryText": "string"},
                    "b": {"headline": "string", "primaryText": "string"}
                }]
            }),
        }
    }
}

impl fmt::Display for CreativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreativeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CreativeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown creative type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaAd {
    pub angle: String,
    pub audience_segment: String,
    pub primary_text: String,
    pub headline: String,
    pub description: String,
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCampaign {
    pub angle: String,
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiktokHook {
    pub angle: String,
    pub hook: String,
    pub on_screen_text: String,
    pub voiceover: String,
    pub shot_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingEmail {
    pub angle: String,
    pub subject_lines: Vec<String>,
    pub preview_text: String,
    pub body_markdown: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Linkedin,
    X,
    Instagram,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub platform: SocialPlatform,
    pub angle: String,
    pub post: String,
    /// The only list without a minimum; absent means none.
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbCopy {
    pub headline: String,
    pub primary_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbVariant {
    pub angle: String,
    pub a: AbCopy,
    pub b: AbCopy,
}

/// Validated model output for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreativeOutput {
    MetaAds {
        ads: Vec<MetaAd>,
    },
    GoogleAds {
        campaigns: Vec<GoogleCampaign>,
    },
    TiktokHooks {
        hooks: Vec<TiktokHook>,
    },
    MarketingEmail {
        email: MarketingEmail,
    },
    SocialPosts {
        posts: Vec<SocialPost>,
    },
    AnglesHooksHeadlines {
        angles: Vec<String>,
        hooks: Vec<String>,
        headlines: Vec<String>,
    },
    AbVariants {
        variants: Vec<AbVariant>,
    },
}

impl CreativeOutput {
    pub fn creative_type(&self) -> CreativeType {
        match self {
            CreativeOutput::MetaAds { .. } => CreativeType::MetaAds,
            CreativeOutput::GoogleAds { .. } => CreativeType::GoogleAds,
            CreativeOutput::TiktokHooks { .. } => CreativeType::TiktokHooks,
            CreativeOutput::MarketingEmail { .. } => CreativeType::MarketingEmail,
            CreativeOutput::SocialPosts { .. } => CreativeType::SocialPosts,
            CreativeOutput::AnglesHooksHeadlines { .. } => CreativeType::AnglesHooksHeadlines,
            CreativeOutput::AbVariants { .. } => CreativeType::AbVariants,
        }
    }

    /// Constraint violations serde cannot express. Empty means valid.
    ///
    /// Paths use the wire field names, e.g. `ads[1].primaryText`.
    pub fn violations(&self) -> Vec<String> {
        let mut v = Violations::default();
        match self {
            CreativeOutput::MetaAds { ads } => {
                v.min_items("ads", ads.len(), 1);
                for (i, ad) in ads.iter().enumerate() {
                    let p = format!("ads[{i}]");
                    v.text(&p, "angle", &ad.angle);
                    v.text(&p, "audienceSegment", &ad.audience_segment);
                    v.text(&p, "primaryText", &ad.primary_text);
                    v.text(&p, "headline", &ad.headline);
                    v.text(&p, "description", &ad.description);
                    v.text(&p, "cta", &ad.cta);
                }
            }
            CreativeOutput::GoogleAds { campaigns } => {
                v.min_items("campaigns", campaigns.len(), 1);
                for (i, c) in campaigns.iter().enumerate() {
                    let p = format!("campaigns[{i}]");
                    v.text(&p, "angle", &c.angle);
                    v.text_list(&format!("{p}.headlines"), &c.headlines, 1);
                    v.text_list(&format!("{p}.descriptions"), &c.descriptions, 1);
                    v.text_list(&format!("{p}.keywords"), &c.keywords, 1);
                }
            }
            CreativeOutput::TiktokHooks { hooks } => {
                v.min_items("hooks", hooks.len(), 1);
                for (i, h) in hooks.iter().enumerate() {
                    let p = format!("hooks[{i}]");
                    v.text(&p, "angle", &h.angle);
                    v.text(&p, "hook", &h.hook);
                    v.text(&p, "onScreenText", &h.on_screen_text);
                    v.text(&p, "voiceover", &h.voiceover);
                    v.text_list(&format!("{p}.shotList"), &h.shot_list, 1);
                }
            }
            CreativeOutput::MarketingEmail { email } => {
                v.text("email", "angle", &email.angle);
                v.text_list("email.subjectLines", &email.subject_lines, 1);
                v.text("email", "previewText", &email.preview_text);
                v.text("email", "bodyMarkdown", &email.body_markdown);
            }
            CreativeOutput::SocialPosts { posts } => {
                v.min_items("posts", posts.len(), 1);
                for (i, post) in posts.iter().enumerate() {
                    let p = format!("posts[{i}]");
                    v.text(&p, "angle", &post.angle);
                    v.text(&p, "post", &post.post);
                    v.text_list(&format!("{p}.hashtags"), &post.hashtags, 0);
                }
            }
            CreativeOutput::AnglesHooksHeadlines {
                angles,
                hooks,
                headlines,
            } => {
                v.text_list("angles", angles, 1);
                v.text_list("hooks", hooks, 1);
                v.text_list("headlines", headlines, 1);
            }
            CreativeOutput::AbVariants { variants } => {
                v.min_items("variants", variants.len(), 1);
                for (i, variant) in variants.iter().enumerate() {
                    let p = format!("variants[{i}]");
                    v.text(&p, "angle", &variant.angle);
                    for (side, copy) in [("a", &variant.a), ("b", &variant.b)] {
                        let sp = format!("{p}.{side}");
                        v.text(&sp, "headline", &copy.headline);
                        v.text(&sp, "primaryText", &copy.primary_text);
                    }
                }
            }
        }
        v.0
    }
}

#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn text(&mut self, parent: &str, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{parent}.{field} must not be empty"));
        }
    }

    fn min_items(&mut self, path: &str, len: usize, min: usize) {
        if len < min {
            self.0
                .push(format!("{path} must contain at least {min} item(s), got {len}"));
        }
    }

    fn text_list(&mut self, path: &str, items: &[String], min: usize) {
        self.min_items(path, items.len(), min);
        for (i, item) in items.iter().enumerate() {
            if item.trim().is_empty() {
                self.0.push(format!("{path}[{i}] must not be empty"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

/// Model output rejected by the strict schema for `creative_type`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("output does not match the {creative_type} schema: {}", .violations.join("; "))]
pub struct SchemaViolation {
    pub creative_type: CreativeType,
    pub violations: Vec<String>,
}

impl SchemaViolation {
    fn single(creative_type: CreativeType, message: impl Into<String>) -> Self {
        Self {
            creative_type,
            violations: vec![message.into()],
        }
    }
}

impl From<SchemaViolation> for CoreError {
    fn from(err: SchemaViolation) -> Self {
        CoreError::Validation(err.to_string())
    }
}

/// Force the discriminator to the requested type.
///
/// The tag is caller-known, never inferred from content. Returns `true` when
/// the value was changed. Non-object values are left alone; validation
/// rejects them.
pub fn ensure_tag(value: &mut Value, creative_type: CreativeType) -> bool {
    let Some(obj) = value.as_object_mut() else {
        return false;
    };
    let expected = creative_type.as_str();
    if obj.get(TAG_FIELD).and_then(Value::as_str) == Some(expected) {
        return false;
    }
    obj.insert(TAG_FIELD.to_string(), Value::String(expected.to_string()));
    true
}

/// Strictly validate `value` against the closed schema for `creative_type`.
pub fn validate(value: &Value, creative_type: CreativeType) -> Result<CreativeOutput, SchemaViolation> {
    if !value.is_object() {
        return Err(SchemaViolation::single(
            creative_type,
            "expected a JSON object at the root",
        ));
    }

    let output: CreativeOutput = serde_json::from_value(value.clone())
        .map_err(|e| SchemaViolation::single(creative_type, e.to_string()))?;

    if output.creative_type() != creative_type {
        return Err(SchemaViolation::single(
            creative_type,
            format!(
                "type is {} but {creative_type} was requested",
                output.creative_type()
            ),
        ));
    }

    let violations = output.violations();
    if violations.is_empty() {
        Ok(output)
    } else {
        Err(SchemaViolation {
            creative_type,
            violations,
        })
    }
}
