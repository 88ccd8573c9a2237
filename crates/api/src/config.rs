/// Default name of the header the hosting platform's scheduler sets on cron
/// invocations.
pub const DEFAULT_SCHEDULER_HEADER: &str = "x-vercel-cron";

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
    /// Shared secret for the scheduler trigger. `None` disables the
    /// bearer and `x-cron-secret` paths.
    pub cron_secret: Option<String>,
    /// Bearer token for operator endpoints. `None` rejects every call.
    pub operator_token: Option<String>,
    /// Header whose value `1` marks a platform scheduler invocation.
    pub scheduler_header: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `CRON_SECRET`          | unset                      |
    /// | `OPERATOR_TOKEN`       | unset                      |
    /// | `SCHEDULER_HEADER`     | `x-vercel-cron`            |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Model calls can take minutes; the trigger waits for the whole batch.
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let scheduler_header = std::env::var("SCHEDULER_HEADER")
            .map(|h| h.trim().to_ascii_lowercase())
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEDULER_HEADER.into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            cron_secret: non_empty_var("CRON_SECRET"),
            operator_token: non_empty_var("OPERATOR_TOKEN"),
            scheduler_header,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
