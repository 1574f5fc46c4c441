//! Top-level error and retry-policy types for the Compliance Copilot domain.
//!
//! [`CopilotError`] covers every condition that stops a generation request,
//! whether before the chain starts (validation, admission, catalog lookup) or
//! while it runs (configuration, upstream failure, cancellation).
//! Component-level errors (e.g. [`crate::AgentCallError`] for upstream calls)
//! are defined next to the trait that produces them.
//!
//! [`RetryPolicy`] tells the inbound surface whether the caller may retry and
//! after what delay. Nothing inside the chain retries on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AgentCallError, AgentId, OperationType, Timestamp};

/// Message shown to callers for every failure that must not describe itself.
pub const GENERATION_FAILED_MESSAGE: &str = "Document generation failed. Please try again.";

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: rate-limit rejections (after the window resets).
/// - `NonRetryable` errors: tainted input, unknown catalog entries,
///   configuration problems, and upstream failures. A failed chain must be
///   resubmitted as a new request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried automatically.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Validation detail
// ---------------------------------------------------------------------------

/// Why a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidationReason {
    /// The value matched a prompt-injection signature.
    InjectionDetected,
    /// A required field was absent or empty.
    MissingField {
        /// Human-readable label of the field, as shown in the form.
        label: String,
    },
    /// The field is not declared by the requested tool.
    UnknownField,
    /// The value is present but does not satisfy a format rule.
    Malformed {
        /// Description of the violated rule.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Request-level errors
// ---------------------------------------------------------------------------

/// Errors that stop a document generation request.
///
/// Validation, rate-limit, and catalog errors are produced synchronously
/// before any streaming begins. Configuration, upstream, and cancellation
/// errors are produced by the chain executor; mid-stream they become a
/// single `error` event.
#[derive(Debug, Error)]
pub enum CopilotError {
    /// A caller-supplied field is missing, malformed, or tainted.
    ///
    /// The request never reaches the chain.
    #[error("Invalid input in field '{field}': {reason:?}")]
    Validation {
        /// Identifier of the offending field.
        field: String,
        /// What was wrong with it.
        reason: ValidationReason,
    },

    /// The caller exhausted its quota for the current window.
    #[error("Rate limit exceeded for {operation}; retry after {retry_after_secs}s")]
    RateLimited {
        /// Operation whose quota was exhausted.
        operation: OperationType,
        /// Whole seconds until the window resets.
        retry_after_secs: u64,
        /// When the window resets.
        reset_at: Timestamp,
    },

    /// Required configuration (e.g. upstream endpoint coordinates) is absent
    /// or the static catalog is inconsistent.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// An individual agent call failed; the whole chain was aborted.
    #[error("Agent '{agent_id}' at chain position {position} failed: {source}")]
    Upstream {
        /// Agent whose call failed.
        agent_id: AgentId,
        /// Zero-based position of that agent in the chain.
        position: usize,
        /// Underlying transport or protocol failure.
        #[source]
        source: AgentCallError,
    },

    /// The chain references an agent identifier that is not registered.
    #[error("Unknown agent: {agent_id}")]
    UnknownAgent {
        /// The unresolved identifier.
        agent_id: String,
    },

    /// The request names a tool that is not in the catalog.
    #[error("Unknown tool: {tool_id}")]
    UnknownTool {
        /// The unresolved identifier.
        tool_id: String,
    },

    /// The caller went away before the chain finished.
    #[error("Chain run cancelled: caller disconnected")]
    Cancelled,
}

impl CopilotError {
    /// Convenience constructor for [`CopilotError::ConfigurationError`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Returns whether the caller may retry this request.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => RetryPolicy::Retryable {
                after: Some(Duration::from_secs(*retry_after_secs)),
            },
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Returns the message that may be shown to the caller.
    ///
    /// Configuration, upstream, and cancellation detail stays server-side.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation {
                field,
                reason: ValidationReason::MissingField { label },
            } => format!("Missing required field: {label} ({field})"),
            Self::Validation {
                field,
                reason: ValidationReason::Malformed { message },
            } => format!("Invalid value for {field}: {message}"),
            Self::Validation {
                field,
                reason: ValidationReason::UnknownField,
            } => format!("Unknown field: {field}"),
            Self::Validation { field, .. } => format!("Invalid input detected in field: {field}"),
            Self::RateLimited { .. } => "Too many requests. Please try again later.".to_string(),
            Self::UnknownTool { .. } => "Tool not found".to_string(),
            Self::UnknownAgent { .. } => "Agent not found".to_string(),
            Self::ConfigurationError { .. } | Self::Upstream { .. } | Self::Cancelled => {
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }
}
