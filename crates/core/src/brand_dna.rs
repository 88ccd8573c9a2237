//! Brand DNA: the structured brand profile synthesized during ingestion.
//!
//! Model output is normalized rather than rejected: every section and field
//! has a default, and a section that is missing, `null`, an array or a scalar
//! becomes its default. Unknown keys the model adds are dropped.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BRAND_DNA_VERSION: &str = "1.0";

fn default_version() -> String {
    BRAND_DNA_VERSION.to_string()
}

/// Decode a section, falling back to its default for non-object input.
fn lenient_section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_object() {
        serde_json::from_value(value).map_err(serde::de::Error::custom)
    } else {
        Ok(T::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDna {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient_section")]
    pub assets: BrandAssets,
    #[serde(default, deserialize_with = "lenient_section")]
    pub brand: BrandIdentity,
    #[serde(default, deserialize_with = "lenient_section")]
    pub tone: Tone,
    #[serde(default, deserialize_with = "lenient_section")]
    pub audience: Audience,
    #[serde(default, deserialize_with = "lenient_section")]
    pub offer: Offer,
    #[serde(default, deserialize_with = "lenient_section")]
    pub constraints: Constraints,
}

impl Default for BrandDna {
    fn default() -> Self {
        Self {
            version: default_version(),
            assets: BrandAssets::default(),
            brand: BrandIdentity::default(),
            tone: Tone::default(),
            audience: Audience::default(),
            offer: Offer::default(),
            constraints: Constraints::default(),
        }
    }
}

impl BrandDna {
    /// Normalize raw model output. Only a non-object root is an error.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(
                "brand DNA must be a JSON object",
            ));
        }
        serde_json::from_value(value)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandAssets {
    pub logos: Vec<AssetRef>,
    pub product_images: Vec<AssetRef>,
    pub og_images: Vec<AssetRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandIdentity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub category: String,
    pub one_liner: String,
    pub value_prop: String,
}

impl Default for BrandIdentity {
    fn default() -> Self {
        Self {
            name: "Unknown Brand".into(),
            website: None,
            category: "General".into(),
            one_liner: String::new(),
            value_prop: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tone {
    pub adjectives: Vec<String>,
    pub voice: String,
    pub style_guidelines: Vec<String>,
    pub words_to_prefer: Vec<String>,
    pub words_to_avoid: Vec<String>,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            adjectives: Vec::new(),
            voice: "Neutral".into(),
            style_guidelines: Vec::new(),
            words_to_prefer: Vec::new(),
            words_to_avoid: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Persona {
    pub name: String,
    pub role: String,
    pub industry: String,
    pub pains: Vec<String>,
    pub desired_outcomes: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Persona".into(),
            role: "User".into(),
            industry: "Any".into(),
            pains: Vec::new(),
            desired_outcomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Audience {
    pub icp_summary: String,
    pub personas: Vec<Persona>,
    pub segments: Vec<String>,
}

impl Default for Audience {
    fn default() -> Self {
        Self {
            icp_summary: "General Audience".into(),
            personas: Vec::new(),
            segments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objection {
    pub objection: String,
    pub rebuttal: String,
}

impl Default for Objection {
    fn default() -> Self {
        Self {
            objection: "Cost".into(),
            rebuttal: "Value".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Offer {
    pub key_benefits: Vec<String>,
    pub differentiators: Vec<String>,
    pub objections: Vec<Objection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub compliance_notes: Vec<String>,
    pub claims_to_avoid: Vec<String>,
}
