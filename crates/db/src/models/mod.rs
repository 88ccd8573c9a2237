//! Row models and DTOs, one module per table.

pub mod brand;
pub mod generation_run;
pub mod ingestion_run;
pub mod job;
pub mod project;
pub mod status;
pub mod visual_asset;
