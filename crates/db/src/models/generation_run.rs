//! Generation run rows.

use adforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{serialize_run_status, RunStatus, StatusId};

/// A row from the `generation_runs` table.
///
/// `output` is only ever written together with `SUCCEEDED`, after the
/// creative schema accepted it.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRun {
    pub id: DbId,
    pub project_id: DbId,
    pub brand_dna_id: DbId,
    #[serde(rename = "type")]
    pub creative_type: String,
    pub parameters: serde_json::Value,
    #[serde(rename = "status", serialize_with = "serialize_run_status")]
    pub status_id: StatusId,
    pub error: Option<String>,
    pub output: Option<serde_json::Value>,
    pub model: Option<String>,
    pub usage: Option<serde_json::Value>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GenerationRun {
    pub fn status(&self) -> Option<RunStatus> {
        RunStatus::from_id(self.status_id)
    }
}

/// DTO for creating a generation run.
#[derive(Debug, Clone)]
pub struct CreateGenerationRun {
    pub project_id: DbId,
    pub brand_dna_id: DbId,
    pub creative_type: String,
    pub parameters: serde_json::Value,
}

/// Successful generation result written in the fan-out transaction.
#[derive(Debug, Clone)]
pub struct GenerationSuccess {
    pub output: serde_json::Value,
    pub model: String,
    pub usage: Option<serde_json::Value>,
}
