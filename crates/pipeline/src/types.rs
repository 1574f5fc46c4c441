//! Shared value types for the Compliance Copilot domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values that flow through a chain run: the agent definitions
//! loaded at startup, the caller's inputs, and the results produced by each
//! agent.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{AgentId, ToolId};

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// A named role with a fixed system instruction.
///
/// Loaded once at process start and never mutated; shared as
/// `Arc<AgentDefinition>` between the registry and every chain run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Registry key (e.g. `"legal"`).
    pub id: AgentId,
    /// Display name (e.g. `"Legal Agent"`).
    pub name: String,
    /// Short icon shown next to the name in progress events and headings.
    pub emoji: String,
    /// Tag used to address the agent upstream (e.g. `"@legal"`).
    pub agent_tag: String,
    /// System instruction sent with every call to this agent.
    pub system_prompt: String,
}

/// The output of one agent invocation within a chain run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Agent that produced the output.
    pub agent_id: AgentId,
    /// Display name of that agent, used to attribute the output downstream.
    pub agent_name: String,
    /// Icon of that agent.
    pub emoji: String,
    /// Reply text returned by the upstream provider.
    pub output: String,
}

impl AgentResult {
    /// Creates a result attributed to `agent`.
    pub fn new(agent: &AgentDefinition, output: impl Into<String>) -> Self {
        Self {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            emoji: agent.emoji.clone(),
            output: output.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Flat field-name → value mapping supplied by the caller.
///
/// Insertion order is preserved so prompts list fields in the order the
/// caller submitted them.
pub type Inputs = IndexMap<String, String>;

/// The caller-supplied bundle for one chain run.
///
/// Every identifier in `chain` must resolve in the [`crate::AgentRegistry`];
/// resolution fails fast on the first unknown identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRequest {
    /// Tool the chain was derived from, when the request came through the catalog.
    pub tool_id: Option<ToolId>,
    /// Agents to execute, in order.
    pub chain: Vec<AgentId>,
    /// Sanitized inputs.
    pub inputs: Inputs,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns this instant shifted forward by `duration`.
    ///
    /// Saturates at the latest representable time.
    pub fn plus(self, duration: Duration) -> Self {
        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
        Self(self.0.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Returns the time from `self` until `later`, or zero if `later` is not
    /// after `self`.
    pub fn until(self, later: Timestamp) -> Duration {
        (later.0 - self.0).to_std().unwrap_or(Duration::ZERO)
    }

    /// Seconds since the Unix epoch (truncated).
    pub fn unix_seconds(self) -> i64 {
        self.0.timestamp()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
