//! Scheduler-triggered cron endpoints
//!
//! External schedulers call these with a bearer secret. The endpoints do
//! not authenticate users; the shared secret is the only gate.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{error::ApiError, state::AppState};

/// Response body for a recurring billing run
#[derive(Debug, Serialize)]
pub struct BillingRunResponse {
    pub success: bool,
    pub message: String,
    pub processed: u32,
    pub skipped: u32,
    pub errors: u32,
    pub total: u32,
}

/// Run the recurring billing batch.
///
/// Rejects with 401 on a missing or mismatched bearer token and 500 when
/// the server-side secret is unconfigured. Returns the aggregate batch
/// summary even when some subscriptions failed; operators consult logs
/// for which ones.
pub async fn run_recurring_billing(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BillingRunResponse>, ApiError> {
    let secret = state.config.cron_secret.as_deref().ok_or_else(|| {
        tracing::error!("CRON_SECRET is not configured, rejecting cron trigger");
        ApiError::Config("CRON_SECRET is not configured".to_string())
    })?;

    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == secret => {}
        _ => {
            tracing::warn!("Rejected cron trigger with missing or invalid bearer token");
            return Err(ApiError::Unauthorized);
        }
    }

    let now = OffsetDateTime::now_utc();
    let summary = state.invoicer.run(now).await.map_err(|e| {
        tracing::error!(error = %e, "Recurring billing run failed");
        ApiError::Internal
    })?;

    Ok(Json(BillingRunResponse {
        success: true,
        message: "Recurring billing run complete".to_string(),
        processed: summary.processed,
        skipped: summary.skipped,
        errors: summary.errors,
        total: summary.total,
    }))
}
