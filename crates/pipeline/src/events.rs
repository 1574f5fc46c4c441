//! Chain lifecycle events.
//!
//! The executor produces these in causal order; the progress stream forwards
//! them to the caller. Field names match the wire format the UI consumes:
//!
//! ```text
//! {"type":"agent_start","agent":{"id":"legal","name":"Legal Agent","emoji":"⚖️"}}
//! {"type":"agent_complete","agentId":"legal","agentName":"Legal Agent","emoji":"⚖️","output":"…"}
//! {"type":"complete","document":"…"}
//! {"type":"error","message":"Document generation failed. Please try again."}
//! ```

use serde::{Deserialize, Serialize};

use crate::{AgentDefinition, AgentId, AgentResult};

/// Public identity of an agent, as shown in progress events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Registry key.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Icon.
    pub emoji: String,
}

impl From<&AgentDefinition> for AgentSummary {
    fn from(agent: &AgentDefinition) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            emoji: agent.emoji.clone(),
        }
    }
}

/// One step of a chain run, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainEvent {
    /// An agent is about to be called.
    AgentStart {
        /// The agent.
        agent: AgentSummary,
    },
    /// An agent returned its output.
    #[serde(rename_all = "camelCase")]
    AgentComplete {
        /// The agent.
        agent_id: AgentId,
        /// Its display name.
        agent_name: String,
        /// Its icon.
        emoji: String,
        /// Its output.
        output: String,
    },
    /// Every agent succeeded; carries the assembled document. Always last.
    Complete {
        /// The final document.
        document: String,
    },
    /// The run failed; carries a caller-safe message. Always last.
    Error {
        /// Generic failure message.
        message: String,
    },
}

impl ChainEvent {
    /// Event announcing that `agent` is starting.
    pub fn agent_start(agent: &AgentDefinition) -> Self {
        Self::AgentStart {
            agent: AgentSummary::from(agent),
        }
    }

    /// Event announcing that `result` is available.
    pub fn agent_complete(result: &AgentResult) -> Self {
        Self::AgentComplete {
            agent_id: result.agent_id.clone(),
            agent_name: result.agent_name.clone(),
            emoji: result.emoji.clone(),
            output: result.output.clone(),
        }
    }

    /// Returns `true` for `complete` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// The `type` discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentStart { .. } => "agent_start",
            Self::AgentComplete { .. } => "agent_complete",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}
