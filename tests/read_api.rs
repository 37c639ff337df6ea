//! Integration tests for the Read API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; no
//! socket is bound. Storage is an in-memory SQLite pool seeded through
//! the repository.

use alloy::primitives::U256;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use transfer_indexer::{
    api::build_router,
    app_state::AppState,
    db::{create_pool, models::NewTransfer, repository::Repository},
};

const FROM: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
const TO: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

fn transfer(tx: &str, block: U256, value: U256) -> NewTransfer {
    NewTransfer {
        tx_hash: tx.to_string(),
        block_number: block,
        from: FROM.to_string(),
        to: TO.to_string(),
        value,
    }
}

async fn setup(rate_limit_rpm: u32) -> eyre::Result<(Router, Repository)> {
    let repo = Repository::new(create_pool("sqlite::memory:").await?);
    let router = build_router(AppState::new(repo.clone()), rate_limit_rpm, &["*".to_string()]);
    Ok((router, repo))
}

async fn seed(repo: &Repository, count: u64) -> eyre::Result<()> {
    let transfers: Vec<NewTransfer> = (1..=count)
        .map(|i| transfer(&format!("0x{i:064x}"), U256::from(100 + i), U256::from(i)))
        .collect();
    repo.batch_insert_transfers(&transfers).await?;
    Ok(())
}

async fn get(router: &Router, uri: &str) -> eyre::Result<(StatusCode, Value)> {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

fn array_len(json: &Value) -> usize {
    json.as_array().map_or(0, Vec::len)
}

#[tokio::test]
async fn test_empty_store_returns_empty_array() -> eyre::Result<()> {
    let (router, _repo) = setup(1000).await?;

    let (status, json) = get(&router, "/transfers").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, Value::Array(vec![]));
    Ok(())
}

#[tokio::test]
async fn test_default_limit_and_ordering() -> eyre::Result<()> {
    let (router, repo) = setup(1000).await?;
    seed(&repo, 30).await?;

    let (status, json) = get(&router, "/transfers").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(array_len(&json), 20);
    assert_eq!(json[0]["blockNumber"], "130");
    assert_eq!(json[19]["blockNumber"], "111");
    Ok(())
}

#[tokio::test]
async fn test_limit_is_coerced() -> eyre::Result<()> {
    let (router, repo) = setup(1000).await?;
    seed(&repo, 30).await?;

    for (query, expected) in [
        ("limit=5", 5),
        ("limit=0", 1),
        ("limit=-10", 1),
        ("limit=abc", 20),
        ("limit=", 20),
        ("limit=5000", 30),
    ] {
        let (status, json) = get(&router, &format!("/transfers?{query}")).await?;
        assert_eq!(status, StatusCode::OK, "{query}");
        assert_eq!(array_len(&json), expected, "{query}");
    }
    Ok(())
}

#[tokio::test]
async fn test_offset_pages_through_results() -> eyre::Result<()> {
    let (router, repo) = setup(1000).await?;
    seed(&repo, 5).await?;

    let (_, first) = get(&router, "/transfers?limit=2").await?;
    let (_, second) = get(&router, "/transfers?limit=2&offset=2").await?;
    let (_, past_end) = get(&router, "/transfers?offset=99").await?;

    let blocks = |json: &Value| -> Vec<String> {
        json.as_array()
            .into_iter()
            .flatten()
            .filter_map(|t| t["blockNumber"].as_str().map(str::to_string))
            .collect()
    };
    assert_eq!(blocks(&first), ["105", "104"]);
    assert_eq!(blocks(&second), ["103", "102"]);
    assert_eq!(array_len(&past_end), 0);
    Ok(())
}

#[tokio::test]
async fn test_record_shape_preserves_precision() -> eyre::Result<()> {
    let (router, repo) = setup(1000).await?;
    let block = U256::from(u64::MAX) + U256::from(1);
    repo.batch_insert_transfers(&[transfer("0xabc", block, U256::MAX)])
        .await?;

    let (_, json) = get(&router, "/transfers?limit=1").await?;
    let record = &json[0];

    assert_eq!(record["txHash"], "0xabc");
    assert_eq!(record["blockNumber"], "18446744073709551616");
    assert_eq!(record["from"], FROM);
    assert_eq!(record["to"], TO);
    assert_eq!(record["value"], U256::MAX.to_string());
    let created_at = record["createdAt"].as_str().unwrap_or_default();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok(), "{created_at}");
    Ok(())
}

#[tokio::test]
async fn test_health_reports_database_and_count() -> eyre::Result<()> {
    let (router, repo) = setup(1000).await?;
    seed(&repo, 3).await?;

    let (status, json) = get(&router, "/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["databaseStatus"], "healthy");
    assert_eq!(json["transferCount"], 3);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptimeSeconds"].is_u64());
    Ok(())
}

#[tokio::test]
async fn test_api_never_touches_checkpoint() -> eyre::Result<()> {
    let (router, repo) = setup(1000).await?;
    seed(&repo, 2).await?;

    get(&router, "/transfers").await?;
    get(&router, "/health").await?;

    assert_eq!(repo.get_checkpoint().await?, None);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_returns_429() -> eyre::Result<()> {
    let (router, _repo) = setup(2).await?;

    assert_eq!(get(&router, "/transfers").await?.0, StatusCode::OK);
    assert_eq!(get(&router, "/transfers").await?.0, StatusCode::OK);

    let (status, json) = get(&router, "/transfers").await?;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "rate_limit_exceeded");
    Ok(())
}

#[tokio::test]
async fn test_openapi_document_is_served() -> eyre::Result<()> {
    let (router, _repo) = setup(1000).await?;

    let (status, json) = get(&router, "/api-docs/openapi.json").await?;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/transfers"].is_object());
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_404() -> eyre::Result<()> {
    let (router, _repo) = setup(1000).await?;

    let (status, _) = get(&router, "/nope").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
