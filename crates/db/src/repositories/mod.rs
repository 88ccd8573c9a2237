//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool` as the first argument. Methods that must be composable inside a
//! caller's transaction take any `PgExecutor` instead.

pub mod brand_repo;
pub mod generation_run_repo;
pub mod ingestion_run_repo;
pub mod job_repo;
pub mod project_repo;
pub mod visual_asset_repo;

pub use brand_repo::BrandRepo;
pub use generation_run_repo::GenerationRunRepo;
pub use ingestion_run_repo::IngestionRunRepo;
pub use job_repo::{FailureOutcome, JobRepo};
pub use project_repo::ProjectRepo;
pub use visual_asset_repo::VisualAssetRepo;
