//! Scripted [`AgentClient`] used by this crate's unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pipeline::{
    AgentCallError, AgentClient, AgentDefinition, AgentId, AgentRegistry, AgentRequest,
    ChainRequest, Inputs,
};

/// Records every prompt it receives and answers `"output of {tag}"`.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    fail_tag: Option<&'static str>,
    hang_tag: Option<&'static str>,
    panic_tag: Option<&'static str>,
    unconfigured: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Calls to `tag` fail with HTTP 500.
    pub(crate) fn failing_on(tag: &'static str) -> Self {
        Self {
            fail_tag: Some(tag),
            ..Self::default()
        }
    }

    /// Calls to `tag` never complete.
    pub(crate) fn hanging_on(tag: &'static str) -> Self {
        Self {
            hang_tag: Some(tag),
            ..Self::default()
        }
    }

    /// Calls to `tag` panic.
    pub(crate) fn panicking_on(tag: &'static str) -> Self {
        Self {
            panic_tag: Some(tag),
            ..Self::default()
        }
    }

    pub(crate) fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    /// `(agent_tag, prompt)` for every call made so far.
    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedClient {
    fn ensure_configured(&self) -> Result<(), AgentCallError> {
        if self.unconfigured {
            Err(AgentCallError::NotConfigured {
                missing: "COMPLETE_DEV_SPACE_ID",
            })
        } else {
            Ok(())
        }
    }

    async fn send(&self, request: AgentRequest<'_>) -> Result<String, AgentCallError> {
        self.calls
            .lock()
            .push((request.agent_tag.to_string(), request.prompt.to_string()));
        if self.fail_tag == Some(request.agent_tag) {
            return Err(AgentCallError::Status { status: 500 });
        }
        if self.panic_tag == Some(request.agent_tag) {
            panic!("scripted panic in {}", request.agent_tag);
        }
        if self.hang_tag == Some(request.agent_tag) {
            std::future::pending::<()>().await;
        }
        Ok(format!("output of {}", request.agent_tag))
    }
}

/// An agent named `"Agent {id}"` addressed as `"@{id}"`.
pub(crate) fn agent(id: &str) -> Arc<AgentDefinition> {
    Arc::new(AgentDefinition {
        id: AgentId::new(id).unwrap(),
        name: format!("Agent {id}"),
        emoji: "🤖".into(),
        agent_tag: format!("@{id}"),
        system_prompt: format!("You are agent {id}."),
    })
}

pub(crate) fn chain(ids: &[&str]) -> Vec<Arc<AgentDefinition>> {
    ids.iter().map(|id| agent(id)).collect()
}

/// A registry holding [`agent`] for each of `ids`.
pub(crate) fn registry(ids: &[&str]) -> AgentRegistry {
    AgentRegistry::from_definitions(ids.iter().map(|id| AgentDefinition::clone(&agent(id))))
        .unwrap()
}

pub(crate) fn request(ids: &[&str], inputs: Inputs) -> ChainRequest {
    ChainRequest {
        tool_id: None,
        chain: ids.iter().map(|id| AgentId::new(*id).unwrap()).collect(),
        inputs,
    }
}
