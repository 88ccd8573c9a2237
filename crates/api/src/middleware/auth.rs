//! Trigger and operator authorization extractors.
//!
//! Both reject with 401 before the handler runs, so an unauthorized call has
//! no side effects.

use adforge_core::error::CoreError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Legacy header carrying the cron secret verbatim.
pub const LEGACY_SECRET_HEADER: &str = "x-cron-secret";

/// How a scheduler trigger call proved itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAuth {
    Bearer,
    LegacySecret,
    Scheduler,
}

/// Caller allowed to hit the scheduler trigger.
#[derive(Debug, Clone, Copy)]
pub struct CronCaller {
    pub via: TriggerAuth,
}

/// Caller holding the operator bearer token.
#[derive(Debug, Clone, Copy)]
pub struct OperatorAuth;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Decide whether `headers` authorize a scheduler trigger call.
///
/// Accepted: `Authorization: Bearer <CRON_SECRET>`, `x-cron-secret:
/// <CRON_SECRET>`, or the scheduler header set to `1`. The secret paths are
/// closed when no secret is configured.
pub fn authorize_trigger(headers: &HeaderMap, config: &ServerConfig) -> Option<TriggerAuth> {
    if let Some(secret) = config.cron_secret.as_deref() {
        if bearer_token(headers) == Some(secret) {
            return Some(TriggerAuth::Bearer);
        }
        if header_str(headers, LEGACY_SECRET_HEADER) == Some(secret) {
            return Some(TriggerAuth::LegacySecret);
        }
    }
    if header_str(headers, &config.scheduler_header).map(str::trim) == Some("1") {
        return Some(TriggerAuth::Scheduler);
    }
    None
}

/// Decide whether `headers` carry the operator token.
pub fn authorize_operator(headers: &HeaderMap, config: &ServerConfig) -> bool {
    match config.operator_token.as_deref() {
        Some(token) => bearer_token(headers) == Some(token),
        None => false,
    }
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized("unauthorized".into()))
}

impl FromRequestParts<AppState> for CronCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let via = authorize_trigger(&parts.headers, &state.config).ok_or_else(|| {
            tracing::warn!(uri = %parts.uri, "Rejected unauthorized trigger call");
            unauthorized()
        })?;
        Ok(CronCaller { via })
    }
}

impl FromRequestParts<AppState> for OperatorAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if authorize_operator(&parts.headers, &state.config) {
            Ok(OperatorAuth)
        } else {
            Err(unauthorized())
        }
    }
}
