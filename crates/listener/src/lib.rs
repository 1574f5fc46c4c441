//! Compliance Copilot inbound HTTP surface.
//!
//! Serves the tool catalog, the streaming document generation endpoint, and
//! the account admission endpoint on top of `axum`.
//!
//! ## API Surface
//!
//! | Route | Module | Notes |
//! |-------|--------|-------|
//! | `GET /healthz` | [`routes`] | Liveness |
//! | `GET /api/tools` | [`routes::tools`] | Catalog listing |
//! | `POST /api/tools/{tool_id}` | [`routes::tools`] | Bearer token; SSE progress stream |
//! | `POST /api/auth` | [`routes::account`] | `register` or `login` action; credentials live elsewhere |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → SecurityHeaders → Handler
//! ```
//!
//! Identity and rate limiting run inside the handlers so that the admission
//! order (identity, then quota) is explicit per route.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP framing, token formats, and header conventions
//! live here. The [`pipeline`] crate sees only [`pipeline::IdentityVerifier`].

pub mod auth;
pub mod error;
pub mod routes;
pub mod sse;
pub mod state;
pub mod sweeper;

use axum::http::header::{
    HeaderValue, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub use auth::{Caller, JwtVerifier};
pub use error::ApiError;
pub use state::AppState;
pub use sweeper::spawn_sweeper;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
