//! Compliance Copilot upstream agent provider adapter.
//!
//! Implements the [`pipeline::AgentClient`] trait for the complete.dev
//! messages API. Another provider is added as a new `impl` in this crate
//! without any change to the `pipeline` or `nodes` crates.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, and reply parsing
//! live here. The [`pipeline`] crate sees only [`pipeline::AgentClient`] and
//! [`pipeline::AgentCallError`].

pub mod client;
pub mod config;

pub use client::CompleteDevClient;
pub use config::{CompleteDevConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
