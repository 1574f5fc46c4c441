//! Live progress stream over one chain run.
//!
//! [`ProgressStream::start`] resolves a [`ChainRequest`], runs the executor on
//! its own task, and hands the caller a [`Stream`] of [`ChainEvent`]s. The
//! channel between them holds a single event, so a slow consumer applies
//! backpressure to the chain instead of accumulating history.
//!
//! Every stream ends with exactly one `complete` or one `error` event, unless
//! the consumer goes away first, in which case nothing more is produced. A
//! panicking agent client counts as a failure. Failure detail is logged here;
//! the caller only sees [`GENERATION_FAILED_MESSAGE`].

use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{FutureExt, Stream};
use pipeline::{
    AgentClient, AgentRegistry, ChainEvent, ChainRequest, CopilotError, GENERATION_FAILED_MESSAGE,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, Instrument};

use crate::ChainExecutor;

/// Events buffered between the executor and the consumer.
pub const EVENT_BUFFER: usize = 1;

/// Ordered lifecycle events of one chain run.
pub struct ProgressStream {
    events: ReceiverStream<ChainEvent>,
}

impl ProgressStream {
    /// Resolves `request.chain` in `registry` and starts it on a new task.
    ///
    /// An unknown agent fails here, before any task or event exists. Must be
    /// called from within a tokio runtime.
    pub fn start<C>(
        executor: Arc<ChainExecutor<C>>,
        registry: &AgentRegistry,
        request: ChainRequest,
    ) -> Result<Self, CopilotError>
    where
        C: AgentClient + ?Sized + 'static,
    {
        let chain = registry.resolve_chain(&request.chain)?;
        let ChainRequest { tool_id, inputs, .. } = request;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let span = tracing::Span::current();

        tokio::spawn(
            async move {
                let run = AssertUnwindSafe(executor.run_with_events(&chain, &inputs, &tx))
                    .catch_unwind()
                    .await;
                let terminal = match run {
                    Ok(Ok(document)) => {
                        info!(tool_id = ?tool_id, sections = document.results().len(), "document generated");
                        ChainEvent::Complete {
                            document: document.render(),
                        }
                    }
                    Ok(Err(CopilotError::Cancelled)) => {
                        info!("caller disconnected; chain run abandoned");
                        return;
                    }
                    Ok(Err(e)) => {
                        error!(tool_id = ?tool_id, error = %e, "document generation failed");
                        ChainEvent::Error {
                            message: GENERATION_FAILED_MESSAGE.to_string(),
                        }
                    }
                    Err(_) => {
                        error!(tool_id = ?tool_id, "chain run panicked");
                        ChainEvent::Error {
                            message: GENERATION_FAILED_MESSAGE.to_string(),
                        }
                    }
                };
                // A consumer that left after the last agent is not an error.
                let _ = tx.send(terminal).await;
            }
            .instrument(span),
        );

        Ok(Self {
            events: ReceiverStream::new(rx),
        })
    }
}

impl Stream for ProgressStream {
    type Item = ChainEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}
