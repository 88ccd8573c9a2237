use std::sync::Arc;

use adforge_pipeline::JobRunner;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and runner are handles, the config is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: adforge_db::DbPool,
    /// Server configuration (trigger secrets, CORS, timeouts).
    pub config: Arc<ServerConfig>,
    /// Runner shared by both HTTP triggers.
    pub runner: JobRunner,
}
