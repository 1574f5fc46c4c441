//! Core domain for Compliance Copilot.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and cross-cutting error type used by the document generation chain,
//! together with the request admission controls (input sanitization and rate
//! limiting) and the static agent/tool catalog. Infrastructure crates
//! implement the traits defined in [`ports`]; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AgentId`, `ToolId`, `CallerId`, etc.) |
//! | [`types`] | Shared value types (`AgentDefinition`, `AgentResult`, `Timestamp`, etc.) |
//! | [`errors`] | Top-level error and retry-policy types |
//! | [`sanitize`] | Input cleaning and prompt-injection screening |
//! | [`rate_limit`] | Fixed-window admission control |
//! | [`registry`] | Agent registry and tool catalog |
//! | [`events`] | Chain lifecycle events |
//! | [`document`] | Final document assembly |
//! | [`ports`] | `AgentClient` and `IdentityVerifier` traits |

pub mod document;
pub mod errors;
pub mod events;
pub mod identifiers;
pub mod ports;
pub mod rate_limit;
pub mod registry;
pub mod sanitize;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use document::{ChainDocument, SECTION_DIVIDER};
pub use errors::{CopilotError, RetryPolicy, ValidationReason, GENERATION_FAILED_MESSAGE};
pub use events::{AgentSummary, ChainEvent};
pub use identifiers::{AgentId, CallerId, ChainRunId, FieldId, ToolId};
pub use ports::{AgentCallError, AgentClient, AgentRequest, IdentityVerifier};
pub use rate_limit::{
    OperationType, RateDecision, RateLimitEntry, RateLimitPolicies, RateLimitPolicy, RateLimiter,
};
pub use registry::{AgentRegistry, FieldKind, ToolCatalog, ToolDefinition, ToolField};
pub use sanitize::{
    bound_input, detect_prompt_injection, FieldLimits, InputSanitizer, SanitizedField,
    DEFAULT_MAX_FIELD_LENGTH, MAX_FIELD_ID_LENGTH,
};
pub use types::{AgentDefinition, AgentResult, ChainRequest, Inputs, Timestamp};
