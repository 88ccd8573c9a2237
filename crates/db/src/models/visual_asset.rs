//! Visual assets rendered by the image stage. Append-only.

use adforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `visual_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAsset {
    pub id: DbId,
    pub generation_run_id: DbId,
    pub format: String,
    pub width: i32,
    pub height: i32,
    pub prompt: String,
    pub result_url: Option<String>,
    pub model: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a rendered asset.
#[derive(Debug, Clone)]
pub struct CreateVisualAsset {
    pub generation_run_id: DbId,
    pub format: String,
    pub width: i32,
    pub height: i32,
    pub prompt: String,
    pub result_url: Option<String>,
    pub model: String,
}
