//! Axum server setup and routing.

use std::future::Future;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::{middleware, routing::get, Router};
use eyre::WrapErr;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{docs::ApiDoc, handlers, middleware as api_middleware};
use crate::app_state::AppState;

/// Build the Read API router with its middleware stack.
///
/// Routes: `GET /transfers`, `GET /health`, Swagger UI at `/swagger-ui`
/// and the OpenAPI document at `/api-docs/openapi.json`.
pub fn build_router(state: AppState, rate_limit_rpm: u32, cors_origins: &[String]) -> Router {
    let limiter = api_middleware::rate_limit::create_rate_limiter(rate_limit_rpm);

    let api_routes = Router::new()
        .route("/transfers", get(handlers::transfers::list_transfers))
        .route("/health", get(handlers::health::health_check));

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(cors_origins))
        .layer(middleware::from_fn(api_middleware::logging::log_requests))
        .layer(middleware::from_fn(move |req, next| {
            api_middleware::rate_limit::rate_limit(limiter.clone(), req, next)
        }));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .layer(middleware_stack)
        .with_state(state)
}

/// Serve the Read API on `0.0.0.0:port` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn run_server<F>(
    state: AppState,
    port: u16,
    rate_limit_rpm: u32,
    cors_origins: &[String],
    shutdown: F,
) -> eyre::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, rate_limit_rpm, cors_origins);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {addr}"))?;

    info!(addr = %addr, rate_limit_rpm, "Read API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .wrap_err("API server failed")?;

    info!("Read API stopped");
    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(header) => Some(header),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new().allow_origin(allowed)
}
