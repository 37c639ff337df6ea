//! Custom extractors for API parameters.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::api::models::{TransfersQuery, DEFAULT_LIMIT, MAX_LIMIT};

/// Pagination parsed leniently from `?limit=&offset=`.
///
/// Never rejects a request: an absent or non-numeric `limit` becomes 20,
/// values below 1 become 1 and values above 1000 become 1000. `offset`
/// falls back to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Rows to return
    pub limit: u32,
    /// Rows to skip
    pub offset: u32,
}

impl Page {
    /// Coerce raw query values into a valid page.
    #[must_use]
    pub fn from_query(query: &TransfersQuery) -> Self {
        let limit = query
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map_or(DEFAULT_LIMIT, |n| {
                u32::try_from(n.clamp(1, i64::from(MAX_LIMIT))).unwrap_or(DEFAULT_LIMIT)
            });

        let offset = query
            .offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX));

        Self { limit, offset }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Malformed query strings are treated as empty
        let query = Query::<TransfersQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        Ok(Self::from_query(&query))
    }
}
