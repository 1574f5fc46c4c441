//! Port traits implemented by infrastructure crates.
//!
//! The chain executor only sees [`AgentClient`]; the inbound surface only sees
//! [`IdentityVerifier`]. Transport, framing, and token formats live in the
//! crates that implement them.

use async_trait::async_trait;
use thiserror::Error;

use crate::CallerId;

// ---------------------------------------------------------------------------
// Upstream agent provider
// ---------------------------------------------------------------------------

/// One prompt addressed to one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRequest<'a> {
    /// Upstream address of the agent (e.g. `"@legal"`).
    pub agent_tag: &'a str,
    /// The agent's fixed system instruction.
    pub system_prompt: &'a str,
    /// Caller inputs plus accumulated context from prior agents.
    pub prompt: &'a str,
}

/// Failure of a single upstream call.
///
/// Variants carry only what is needed for server-side diagnosis; upstream
/// response bodies are logged by the client and never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentCallError {
    /// Required upstream coordinates or credentials are absent.
    #[error("upstream client is not configured: missing {missing}")]
    NotConfigured {
        /// Name of the missing setting.
        missing: &'static str,
    },

    /// The provider answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The request never completed (connection, TLS, or timeout failure).
    #[error("upstream transport failure: {message}")]
    Transport {
        /// Transport error description.
        message: String,
    },

    /// The reply body could not be parsed.
    #[error("upstream reply was not valid JSON: {message}")]
    InvalidBody {
        /// Parser error description.
        message: String,
    },

    /// The reply parsed but carried no reply text.
    #[error("upstream reply contained no content")]
    EmptyReply,
}

/// Sends one prompt to the external agent provider and returns its reply.
///
/// Implementations carry no business logic and perform exactly one attempt
/// per call.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Checks that every coordinate needed to reach the provider is present.
    ///
    /// Called once before a chain starts so a misconfigured deployment fails
    /// before any progress is reported.
    fn ensure_configured(&self) -> Result<(), AgentCallError> {
        Ok(())
    }

    /// Performs one request/response round trip.
    async fn send(&self, request: AgentRequest<'_>) -> Result<String, AgentCallError>;
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// Turns a bearer token into a caller identity.
///
/// Token issuance and the credential store are external; this port only
/// answers "is this token valid, and whose is it".
pub trait IdentityVerifier: Send + Sync {
    /// Returns the caller identity for a valid token, `None` otherwise.
    fn verify(&self, token: &str) -> Option<CallerId>;
}
