//! Repository for the append-only `visual_assets` table.

use adforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::visual_asset::{CreateVisualAsset, VisualAsset};

const COLUMNS: &str = "\
    id, generation_run_id, format, width, height, prompt, result_url, model, created_at";

/// Provides insert and listing for rendered assets.
pub struct VisualAssetRepo;

impl VisualAssetRepo {
    pub async fn create(pool: &PgPool, input: &CreateVisualAsset) -> Result<VisualAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO visual_assets \
                 (generation_run_id, format, width, height, prompt, result_url, model) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VisualAsset>(&query)
            .bind(input.generation_run_id)
            .bind(&input.format)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.prompt)
            .bind(&input.result_url)
            .bind(&input.model)
            .fetch_one(pool)
            .await
    }

    /// Assets of one generation run in insertion order.
    pub async fn list_for_generation(
        pool: &PgPool,
        generation_run_id: DbId,
    ) -> Result<Vec<VisualAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visual_assets WHERE generation_run_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, VisualAsset>(&query)
            .bind(generation_run_id)
            .fetch_all(pool)
            .await
    }
}
