//! # API Error Types
//!
//! Maps [`CopilotError`] and request-framing failures to structured HTTP
//! responses. Server-side failures are logged here and answered with a
//! generic message; their detail never reaches the caller.

use axum::http::header::{HeaderName, HeaderValue, RETRY_AFTER};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::{CopilotError, RateDecision, RetryPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const X_RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub(crate) const X_RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Code, message, and optional details of an [`ErrorBody`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. `"NOT_FOUND"`, `"VALIDATION_ERROR"`).
    pub code: String,
    /// Caller-safe message.
    pub message: String,
    /// Extra context, present only for rate-limit rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error type returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unusable bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The body is not a JSON object of the expected shape.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// `POST /api/auth` named no action or an unknown one.
    #[error("invalid action")]
    InvalidAction,

    /// The operation belongs to a service this process does not host.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Copilot(#[from] CopilotError),
}

impl ApiError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::MalformedBody(_) | Self::InvalidAction => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            Self::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
            Self::Copilot(err) => match err {
                CopilotError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CopilotError::RateLimited { .. } => {
                    (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS")
                }
                CopilotError::UnknownTool { .. } | CopilotError::UnknownAgent { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND")
                }
                CopilotError::ConfigurationError { .. }
                | CopilotError::Upstream { .. }
                | CopilotError::Cancelled => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Unauthorized(message) | Self::NotImplemented(message) => (*message).to_string(),
            Self::MalformedBody(_) => "Request body must be a JSON object".to_string(),
            Self::InvalidAction => "Invalid action".to_string(),
            Self::Copilot(err) => err.user_message(),
        }
    }

    /// `(retry_after_secs, reset_unix_secs)` for retryable rejections.
    fn throttle(&self) -> Option<(u64, i64)> {
        let Self::Copilot(err) = self else {
            return None;
        };
        match (err, err.retry_policy()) {
            (CopilotError::RateLimited { reset_at, .. }, RetryPolicy::Retryable { after }) => Some((
                after.map_or(0, |delay| delay.as_secs()),
                reset_at.unix_seconds(),
            )),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::Copilot(err) if status.is_server_error() => {
                tracing::error!(error = %err, "request failed");
            }
            Self::Copilot(CopilotError::RateLimited { operation, .. }) => {
                tracing::info!(%operation, "request throttled");
            }
            Self::MalformedBody(detail) => tracing::debug!(%detail, "malformed request body"),
            _ => {}
        }

        let throttle = self.throttle();
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.message(),
                details: throttle
                    .map(|(retry_after, _)| serde_json::json!({ "retryAfter": retry_after })),
            },
        };

        let mut headers = HeaderMap::new();
        if let Some((retry_after, reset)) = throttle {
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
            headers.insert(X_RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
            headers.insert(X_RATE_LIMIT_RESET, HeaderValue::from(reset));
        }

        (status, headers, Json(body)).into_response()
    }
}

/// `X-RateLimit-Remaining` / `X-RateLimit-Reset` for an admitted request.
pub(crate) fn rate_limit_headers(decision: &RateDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(
        X_RATE_LIMIT_RESET,
        HeaderValue::from(decision.reset_at.unix_seconds()),
    );
    headers
}
