//! Compliance Copilot agent chain orchestration.
//!
//! This crate provides the [`ChainExecutor`] that runs an ordered list of
//! agents, threading each agent's output into the next agent's prompt, and the
//! [`ProgressStream`] that exposes a run's lifecycle as an ordered event
//! stream.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The executor sequences calls between the domain
//! types in the [`pipeline`] crate and the [`pipeline::AgentClient`] port. It
//! contains no transport details and no admission rules of its own.

pub mod executor;
pub mod progress;
pub mod prompt;

#[cfg(test)]
mod testing;

pub use executor::ChainExecutor;
pub use progress::{ProgressStream, EVENT_BUFFER};
pub use prompt::{build_prompt, CONTRIBUTIONS_HEADER};
