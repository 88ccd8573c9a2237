//! Domain types and pure logic for the creative-generation job pipeline.
//!
//! Nothing in this crate touches the database or the network. The queue
//! arithmetic (claimability, backoff), the closed creative-output schema and
//! the Brand DNA shape live here so every other crate shares one definition.

pub mod brand_dna;
pub mod creative;
pub mod error;
pub mod export;
pub mod image_format;
pub mod job;
pub mod types;
