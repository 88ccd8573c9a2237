//! Brand DNA snapshots and the scraped pages they were built from.

use adforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `brand_dna` table. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDnaRecord {
    pub id: DbId,
    pub project_id: DbId,
    pub dna: serde_json::Value,
    #[serde(skip_serializing)]
    pub corpus: String,
    pub created_at: Timestamp,
}

/// A row from the `brand_pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPage {
    pub id: DbId,
    pub project_id: DbId,
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub content_sha: String,
    pub created_at: Timestamp,
}

/// DTO for persisting a scraped page.
#[derive(Debug, Clone)]
pub struct NewBrandPage {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    /// Lowercase hex SHA-256 of `content`.
    pub content_sha: String,
}
