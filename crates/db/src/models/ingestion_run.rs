//! Ingestion run rows.

use adforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{serialize_run_status, RunStatus, StatusId};

/// A row from the `ingestion_runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRun {
    pub id: DbId,
    pub project_id: DbId,
    pub input_url: String,
    #[serde(rename = "status", serialize_with = "serialize_run_status")]
    pub status_id: StatusId,
    pub error: Option<String>,
    pub brand_dna_id: Option<DbId>,
    pub stats: Option<serde_json::Value>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl IngestionRun {
    pub fn status(&self) -> Option<RunStatus> {
        RunStatus::from_id(self.status_id)
    }
}
