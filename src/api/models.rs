//! API request and response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::TransferRecord;

/// Page size when `limit` is absent or not a number.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page the API will return.
pub const MAX_LIMIT: u32 = 1000;

/// A stored transfer as returned by `GET /transfers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferView {
    /// Transaction hash
    #[schema(example = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060")]
    pub tx_hash: String,
    /// Block number, base-10 string (may exceed 64 bits)
    #[schema(example = "19000000")]
    pub block_number: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Amount in the token's smallest unit, base-10 string
    #[schema(example = "1000000")]
    pub value: String,
    /// When the row was indexed (RFC 3339)
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<TransferRecord> for TransferView {
    fn from(record: TransferRecord) -> Self {
        Self {
            tx_hash: record.tx_hash,
            block_number: record.block_number,
            from: record.from_address,
            to: record.to_address,
            value: record.value,
            created_at: DateTime::from_timestamp(record.created_at, 0).unwrap_or_default(),
        }
    }
}

/// Query parameters for `GET /transfers`.
///
/// Both are lenient: bad values fall back to defaults instead of a 400.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransfersQuery {
    /// Page size, clamped to 1..=1000 (default 20)
    #[param(value_type = Option<i64>, example = 20)]
    pub limit: Option<String>,
    /// Rows to skip (default 0)
    #[param(value_type = Option<i64>, example = 0)]
    pub offset: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Application version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Database status
    pub database_status: HealthStatus,
    /// Number of stored transfers, when the database is reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_count: Option<u64>,
}

/// Health status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All services healthy
    Healthy,
    /// Unhealthy state
    Unhealthy,
}

/// Error response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type
    pub error: String,
    /// Human-readable message
    pub message: String,
}
