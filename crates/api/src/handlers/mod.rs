pub mod jobs;
pub mod projects;
pub mod runs;
pub mod triggers;
