//! OpenAPI documentation for the Read API.

use utoipa::OpenApi;

use crate::api::handlers;

/// OpenAPI documentation for the Read API.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::transfers::list_transfers,
        handlers::health::health_check,
    ),
    components(schemas(
        crate::api::models::TransferView,
        crate::api::models::HealthResponse,
        crate::api::models::HealthStatus,
        crate::api::models::ErrorResponse,
    )),
    tags(
        (name = "Transfers", description = "Indexed ERC-20 transfers"),
        (name = "Health", description = "Health check endpoints"),
    ),
    info(
        title = "Transfer Indexer API",
        version = "0.1.0",
        description = "Read-only access to indexed ERC-20 Transfer events",
    )
)]
pub struct ApiDoc;
