use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use podcache_core::{PageRequest, SearchQuery, paginate, search};
use serde::Serialize;
use serde_json::json;
use time::format_description::well_known::Rfc3339;

use crate::error::ApiError;
use crate::middleware::UserIdentity;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    pub status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "podcache",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

pub async fn metrics() -> Response {
    match crate::metrics::render_metrics() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// `GET /pods?page=&limit=`
///
/// Non-numeric or non-positive paging values fall back to the defaults.
pub async fn list_pods(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request = PageRequest::from_params(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
    );
    let cached = state.cache.get_or_refresh(user.as_str()).await;
    let page = paginate(cached.items(), request);
    tracing::debug!(
        user = %user,
        page = page.page,
        limit = page.limit,
        total = page.total,
        "Listed pods"
    );
    Json(page).into_response()
}

/// `GET /search?q=`
///
/// The query is validated before the cache is consulted, so a bad request
/// never triggers an upstream fetch.
pub async fn search_pods(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = SearchQuery::parse(params.get("q").map(String::as_str))?;
    let cached = state.cache.get_or_refresh(user.as_str()).await;
    let result = search(cached.items(), &query);
    tracing::debug!(user = %user, query = %result.query, count = result.count, "Searched pods");
    Ok(Json(result).into_response())
}

/// `GET /cache/stats`
///
/// Reports store-wide counters and the caller's own entry. Never triggers a
/// refresh.
pub async fn cache_stats(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> impl IntoResponse {
    let cache = &state.cache;
    let settings = cache.settings();
    let stats = cache.stats();
    let now = cache.clock().now();

    let entry = cache.peek(user.as_str()).map(|cached| {
        json!({
            "items": cached.items().len(),
            "fetched_at": cached.fetched_at().format(&Rfc3339).ok(),
            "age_secs": cached.age(now).whole_seconds().max(0),
            "stale": cached.is_stale(now, settings.ttl),
        })
    });

    let body = json!({
        "ttl_secs": settings.ttl.as_secs(),
        "coalesce_refreshes": settings.coalesce_refreshes,
        "hit_rate": stats.hit_rate(),
        "stats": stats,
        "user": entry,
    });
    (StatusCode::OK, Json(body))
}
