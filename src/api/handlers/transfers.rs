//! Transfer listing endpoint.

use axum::{extract::State, Json};
use tracing::{debug, instrument};

use crate::api::extractors::Page;
use crate::api::middleware::error::ApiError;
use crate::api::models::{TransferView, TransfersQuery};
use crate::app_state::AppState;

#[utoipa::path(
    get,
    path = "/transfers",
    params(TransfersQuery),
    responses(
        (status = 200, description = "Most recent transfers, highest block first", body = [TransferView]),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Database unavailable", body = crate::api::models::ErrorResponse)
    ),
    tag = "Transfers"
)]
/// Returns the most recent transfers, newest block first.
///
/// An empty store yields `[]`.
#[instrument(skip(state))]
pub async fn list_transfers(
    State(state): State<AppState>,
    page: Page,
) -> Result<Json<Vec<TransferView>>, ApiError> {
    let records = state
        .repository
        .list_recent_transfers(page.limit, page.offset)
        .await?;

    debug!(count = records.len(), "Listed transfers");

    Ok(Json(records.into_iter().map(TransferView::from).collect()))
}
