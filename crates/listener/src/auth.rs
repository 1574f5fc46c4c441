//! # Caller Identity
//!
//! Bearer-token extraction and HS256 JWT verification. Token issuance lives
//! in the external credential store; this module only checks signatures and
//! takes the `sub` claim as the caller id.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pipeline::{CallerId, IdentityVerifier};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies HS256 tokens signed with a shared secret.
///
/// `exp` and `nbf` are enforced when present; `sub` is required.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Verifier for tokens signed with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub"]);
        validation.validate_nbf = true;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Option<CallerId> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => CallerId::new(data.claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "token rejected");
                None
            }
        }
    }
}

/// Extracts `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The verified identity of the caller.
///
/// Rejects with 401 when the header is absent or the token does not verify.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerId);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized("Unauthorized"))?;
        state
            .verifier
            .verify(token)
            .map(Caller)
            .ok_or(ApiError::Unauthorized("Invalid or expired token"))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        exp: Option<i64>,
    }

    fn token(secret: &[u8], sub: &str, exp: Option<i64>) -> String {
        encode(
            &Header::default(),
            &TestClaims { sub, exp },
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn accepts_token_signed_with_secret() {
        let verifier = JwtVerifier::new(b"secret");
        let caller = verifier.verify(&token(b"secret", "user-1", Some(now() + 600)));
        assert_eq!(caller.unwrap().as_str(), "user-1");
    }

    #[test]
    fn accepts_token_without_expiry() {
        let verifier = JwtVerifier::new(b"secret");
        assert!(verifier.verify(&token(b"secret", "user-1", None)).is_some());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let verifier = JwtVerifier::new(b"secret");
        assert!(verifier.verify(&token(b"other", "user-1", None)).is_none());
        assert!(verifier
            .verify(&token(b"secret", "user-1", Some(now() - 3600)))
            .is_none());
        assert!(verifier.verify("not-a-jwt").is_none());
    }

    #[test]
    fn rejects_empty_subject() {
        let verifier = JwtVerifier::new(b"secret");
        assert!(verifier.verify(&token(b"secret", "", None)).is_none());
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let (parts, ()) = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc.def"));

        let (parts, ()) = Request::builder()
            .header(AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
