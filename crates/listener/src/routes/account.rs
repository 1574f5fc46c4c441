//! # Account Routes
//!
//! `POST /api/auth` dispatches on the body's `action`:
//!
//! - `register` validates a sign-up request against the password policy.
//! - `login` checks that credentials were supplied.
//!
//! Both are admitted under the `auth` quota, keyed per action and client
//! address. Persisting accounts, checking credentials, and issuing tokens
//! belong to the external credential store, so a well-formed login is
//! answered with 501.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pipeline::{bound_input, CopilotError, OperationType, ValidationReason};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::client_ip;
use crate::state::AppState;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 12;
/// The only non-alphanumeric characters a password may contain; one is required.
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";
/// Shown when a password fails [`meets_password_policy`].
pub const PASSWORD_POLICY_MESSAGE: &str =
    "Password must be 12+ chars with uppercase, lowercase, number, and symbol";

const MAX_COMPANY_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Body of a successful registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// Account routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth", post(authenticate))
}

/// POST /api/auth
async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: AuthRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    match request.action.as_deref() {
        Some("register") => register(&state, &headers, &request),
        Some("login") => login(&state, &headers, &request),
        _ => Err(ApiError::InvalidAction),
    }
}

fn admit(state: &AppState, headers: &HeaderMap, action: &str) -> Result<(), ApiError> {
    let identity = format!("{action}:{}", client_ip(headers));
    state
        .limiter
        .check(&identity, OperationType::Auth)
        .into_result(OperationType::Auth)?;
    Ok(())
}

fn register(state: &AppState, headers: &HeaderMap, request: &AuthRequest) -> Result<Response, ApiError> {
    admit(state, headers, "register")?;

    let company_name = required(request.company_name.as_deref(), "companyName", "Company name")?;
    let email = required(request.email.as_deref(), "email", "Email")?;
    let password = required(request.password.as_deref(), "password", "Password")?;

    if !meets_password_policy(password) {
        return Err(CopilotError::Validation {
            field: "password".to_string(),
            reason: ValidationReason::Malformed {
                message: PASSWORD_POLICY_MESSAGE.to_string(),
            },
        }
        .into());
    }

    tracing::info!(
        company = %bound_input(company_name, MAX_COMPANY_NAME_LENGTH),
        email = %bound_input(email, MAX_EMAIL_LENGTH),
        "registration accepted"
    );

    let response = RegisterResponse {
        success: true,
        message: "Account created".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

fn login(state: &AppState, headers: &HeaderMap, request: &AuthRequest) -> Result<Response, ApiError> {
    admit(state, headers, "login")?;

    let email = required(request.email.as_deref(), "email", "Email")?;
    required(request.password.as_deref(), "password", "Password")?;

    tracing::info!(email = %bound_input(email, MAX_EMAIL_LENGTH), "login deferred to credential store");
    Err(ApiError::NotImplemented("Login is handled by the credential store"))
}

fn required<'a>(value: Option<&'a str>, field: &str, label: &str) -> Result<&'a str, ApiError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        CopilotError::Validation {
            field: field.to_string(),
            reason: ValidationReason::MissingField {
                label: label.to_string(),
            },
        }
        .into()
    })
}

/// At least [`MIN_PASSWORD_LENGTH`] characters drawn only from letters,
/// digits, and [`PASSWORD_SYMBOLS`], with at least one of each class.
pub fn meets_password_policy(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}
