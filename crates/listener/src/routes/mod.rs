//! Route modules grouped by surface.

pub mod account;
pub mod tools;

use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use pipeline::bound_input;

use crate::state::AppState;

const MAX_CLIENT_IP_LENGTH: usize = 64;

/// Every route the service serves, before state and middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(tools::router())
        .merge(account::router())
}

/// GET /healthz
async fn healthz() -> &'static str {
    "ok"
}

/// First `X-Forwarded-For` hop, or `"unknown"`.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|hop| bound_input(hop, MAX_CLIENT_IP_LENGTH))
        .filter(|hop| !hop.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
