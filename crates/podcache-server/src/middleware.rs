use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;

// =============================================================================
// Identity Middleware
// =============================================================================

/// Opaque caller identity taken from the configured header.
///
/// Inserted into request extensions by [`user_identity`]; handlers that
/// touch the cache extract it with `Extension<UserIdentity>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// State for the identity middleware.
#[derive(Clone)]
pub struct IdentityState {
    header: HeaderName,
    /// Header name as configured, for error messages.
    label: String,
}

impl IdentityState {
    pub fn new(header: &str) -> Result<Self, String> {
        let name = HeaderName::from_bytes(header.as_bytes())
            .map_err(|e| format!("invalid identity header '{header}': {e}"))?;
        Ok(Self {
            header: name,
            label: header.to_string(),
        })
    }
}

/// Rejects requests without a caller identity before they reach any handler.
///
/// Public endpoints (health, metrics, root) skip the check. A missing, empty
/// or non-ASCII header value yields 401.
pub async fn user_identity(
    State(state): State<IdentityState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if should_skip_identity(req.uri().path()) {
        return next.run(req).await;
    }

    let user = req
        .headers()
        .get(&state.header)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(UserIdentity::new);

    match user {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "Missing identity header");
            ApiError::unauthorized(format!("Missing {} header", state.label)).into_response()
        }
    }
}

fn should_skip_identity(path: &str) -> bool {
    const PUBLIC_PATHS: [&str; 4] = ["/", "/healthz", "/readyz", "/metrics"];
    PUBLIC_PATHS.contains(&path)
}

// =============================================================================
// Other Middleware
// =============================================================================

// Middleware that ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    let req_id_value = req
        .headers()
        .get(&header_name)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

/// Records request count and latency per route.
pub async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    crate::metrics::record_http_request(&method, &path, res.status().as_u16(), started.elapsed());
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_skip_identity() {
        assert!(should_skip_identity("/healthz"));
        assert!(should_skip_identity("/metrics"));
        assert!(!should_skip_identity("/pods"));
        assert!(!should_skip_identity("/search"));
        assert!(!should_skip_identity("/cache/stats"));
    }

    #[test]
    fn identity_header_is_normalized() {
        let state = IdentityState::new("X-User-ID").unwrap();
        assert_eq!(state.header.as_str(), "x-user-id");
        assert_eq!(state.label, "X-User-ID");
    }

    #[test]
    fn invalid_identity_header_is_rejected() {
        assert!(IdentityState::new("bad header").is_err());
    }
}
