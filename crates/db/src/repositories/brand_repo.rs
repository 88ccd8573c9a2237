//! Repository for `brand_pages` and `brand_dna`.

use adforge_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::brand::{BrandDnaRecord, BrandPage, NewBrandPage};

const DNA_COLUMNS: &str = "id, project_id, dna, corpus, created_at";

const PAGE_COLUMNS: &str = "id, project_id, url, title, content, content_sha, created_at";

/// Provides persistence for scraped pages and Brand DNA snapshots.
pub struct BrandRepo;

impl BrandRepo {
    /// Persist scraped pages, skipping any whose content hash the project
    /// already has. Returns the number of rows actually inserted.
    pub async fn insert_pages(
        pool: &PgPool,
        project_id: DbId,
        pages: &[NewBrandPage],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for page in pages {
            let result = sqlx::query(
                "INSERT INTO brand_pages (project_id, url, title, content, content_sha) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (project_id, content_sha) DO NOTHING",
            )
            .bind(project_id)
            .bind(&page.url)
            .bind(&page.title)
            .bind(&page.content)
            .bind(&page.content_sha)
            .execute(pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    /// All stored pages for a project, oldest first.
    pub async fn list_pages(pool: &PgPool, project_id: DbId) -> Result<Vec<BrandPage>, sqlx::Error> {
        let query = format!(
            "SELECT {PAGE_COLUMNS} FROM brand_pages WHERE project_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, BrandPage>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Insert an immutable Brand DNA snapshot.
    pub async fn create_dna<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: DbId,
        dna: &serde_json::Value,
        corpus: &str,
    ) -> Result<BrandDnaRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO brand_dna (project_id, dna, corpus) \
             VALUES ($1, $2, $3) \
             RETURNING {DNA_COLUMNS}"
        );
        sqlx::query_as::<_, BrandDnaRecord>(&query)
            .bind(project_id)
            .bind(dna)
            .bind(corpus)
            .fetch_one(executor)
            .await
    }

    /// Find a Brand DNA snapshot by its ID.
    pub async fn find_dna(pool: &PgPool, id: DbId) -> Result<Option<BrandDnaRecord>, sqlx::Error> {
        let query = format!("SELECT {DNA_COLUMNS} FROM brand_dna WHERE id = $1");
        sqlx::query_as::<_, BrandDnaRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
