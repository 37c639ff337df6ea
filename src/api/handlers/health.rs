//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use std::time::SystemTime;
use tracing::{instrument, warn};

use crate::api::models::{HealthResponse, HealthStatus};
use crate::app_state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
/// Returns service health information.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = SystemTime::now()
        .duration_since(state.start_time)
        .unwrap_or_default()
        .as_secs();

    let (database_status, transfer_count) = match state.repository.health_check().await {
        Ok(()) => (
            HealthStatus::Healthy,
            state.repository.count_transfers().await.ok(),
        ),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            (HealthStatus::Unhealthy, None)
        }
    };

    let code = match database_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status: database_status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            database_status,
            transfer_count,
        }),
    )
}
