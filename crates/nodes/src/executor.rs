//! Sequential agent chain executor.
//!
//! [`ChainExecutor`] consumes an immutable, ordered list of agents and produces
//! an accumulating list of results. Agent *i + 1* needs agent *i*'s full
//! output as context, so calls are made strictly one after another.
//!
//! Lifecycle notification goes through an optional
//! [`tokio::sync::mpsc::Sender`]: [`ChainExecutor::run_with_events`] drives a
//! live stream, [`ChainExecutor::run`] serves batch callers with the same
//! logic and no events.
//!
//! A failing agent aborts the whole chain. There is no partial document and no
//! retry; a failed chain is retried only by resubmitting the request.

use std::sync::Arc;

use pipeline::{
    AgentDefinition, AgentRequest, AgentResult, AgentClient, ChainDocument, ChainEvent,
    ChainRunId, CopilotError, Inputs,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::prompt::build_prompt;

/// Runs agent chains against one [`AgentClient`].
pub struct ChainExecutor<C: ?Sized> {
    client: Arc<C>,
}

impl<C: AgentClient + ?Sized> ChainExecutor<C> {
    /// Creates an executor calling agents through `client`.
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Runs `chain` without emitting events.
    pub async fn run(
        &self,
        chain: &[Arc<AgentDefinition>],
        inputs: &Inputs,
    ) -> Result<ChainDocument, CopilotError> {
        self.execute(chain, inputs, None).await
    }

    /// Runs `chain`, sending `agent_start` / `agent_complete` events to `events`.
    ///
    /// Terminal events (`complete` / `error`) are left to the caller. If the
    /// receiving side is dropped the run stops at the next send, or
    /// immediately if an upstream call is in flight, with
    /// [`CopilotError::Cancelled`].
    pub async fn run_with_events(
        &self,
        chain: &[Arc<AgentDefinition>],
        inputs: &Inputs,
        events: &mpsc::Sender<ChainEvent>,
    ) -> Result<ChainDocument, CopilotError> {
        self.execute(chain, inputs, Some(events)).await
    }

    #[instrument(skip_all, fields(run_id = %ChainRunId::new_random(), agents = chain.len()))]
    async fn execute(
        &self,
        chain: &[Arc<AgentDefinition>],
        inputs: &Inputs,
        events: Option<&mpsc::Sender<ChainEvent>>,
    ) -> Result<ChainDocument, CopilotError> {
        if chain.is_empty() {
            return Err(CopilotError::configuration("agent chain is empty"));
        }
        self.client.ensure_configured().map_err(|e| {
            error!(error = %e, "upstream client is not configured");
            CopilotError::configuration(e.to_string())
        })?;

        let mut results: Vec<AgentResult> = Vec::with_capacity(chain.len());

        for (position, agent) in chain.iter().enumerate() {
            emit(events, ChainEvent::agent_start(agent)).await?;

            let prompt = build_prompt(inputs, &results);
            let request = AgentRequest {
                agent_tag: &agent.agent_tag,
                system_prompt: &agent.system_prompt,
                prompt: &prompt,
            };
            debug!(agent_id = %agent.id, position, prompt_chars = prompt.len(), "calling agent");

            let reply = match events {
                Some(tx) => tokio::select! {
                    biased;
                    () = tx.closed() => return Err(CopilotError::Cancelled),
                    reply = self.client.send(request) => reply,
                },
                None => self.client.send(request).await,
            };

            let output = reply.map_err(|source| {
                error!(agent_id = %agent.id, position, error = %source, "agent call failed; aborting chain");
                CopilotError::Upstream {
                    agent_id: agent.id.clone(),
                    position,
                    source,
                }
            })?;

            results.push(AgentResult::new(agent, output));
            if let Some(result) = results.last() {
                emit(events, ChainEvent::agent_complete(result)).await?;
            }
        }

        info!("chain completed");
        Ok(ChainDocument::new(results))
    }
}

async fn emit(
    events: Option<&mpsc::Sender<ChainEvent>>,
    event: ChainEvent,
) -> Result<(), CopilotError> {
    match events {
        Some(tx) => tx.send(event).await.map_err(|_| {
            debug!("event receiver dropped; stopping chain");
            CopilotError::Cancelled
        }),
        None => Ok(()),
    }
}
