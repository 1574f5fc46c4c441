//! # Application State
//!
//! Shared handles injected into every handler. Everything except the rate
//! limiter is immutable after startup.

use std::sync::Arc;

use nodes::ChainExecutor;
use pipeline::{AgentClient, AgentRegistry, IdentityVerifier, InputSanitizer, RateLimiter, ToolCatalog};

/// Handles cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Agents available to chains.
    pub registry: Arc<AgentRegistry>,
    /// Tools served by `/api/tools`.
    pub catalog: Arc<ToolCatalog>,
    /// Cleans generation inputs before they reach a prompt.
    pub sanitizer: Arc<InputSanitizer>,
    /// Process-wide admission counters.
    pub limiter: Arc<RateLimiter>,
    /// Runs chains against the upstream client.
    pub executor: Arc<ChainExecutor<dyn AgentClient>>,
    /// Resolves bearer tokens to callers.
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// State over the built-in registry and catalog with default sanitizer
    /// limits.
    pub fn new(
        client: Arc<dyn AgentClient>,
        verifier: Arc<dyn IdentityVerifier>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            registry: Arc::new(AgentRegistry::builtin()),
            catalog: Arc::new(ToolCatalog::builtin()),
            sanitizer: Arc::new(InputSanitizer::default()),
            limiter,
            executor: Arc::new(ChainExecutor::new(client)),
            verifier,
        }
    }
}
