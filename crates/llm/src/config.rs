//! Connection settings for the complete.dev agent provider.

use std::fmt;
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://core-api.deploy.ai";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Where and how to reach the provider.
///
/// Every coordinate except the base URL is optional at construction time. A
/// missing one is reported by [`crate::CompleteDevClient`] on each chain run,
/// so a partially configured deployment still starts and serves the catalog.
#[derive(Clone)]
pub struct CompleteDevConfig {
    /// Bearer key sent on every call.
    pub api_key: Option<String>,
    /// Provider root, with or without a trailing `/`.
    pub base_url: String,
    /// Space that owns the channel.
    pub space_id: Option<String>,
    /// Channel the agent messages are posted to.
    pub channel_id: Option<String>,
    /// Upper bound on one call, including reading the reply.
    pub timeout: Duration,
}

impl CompleteDevConfig {
    /// A fully specified configuration against `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        space_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: base_url.into(),
            space_id: Some(space_id.into()),
            channel_id: Some(channel_id.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base_url}/spaces/{space_id}/channels/{channel_id}/messages`, or the
    /// name of the first missing setting.
    pub(crate) fn messages_url(&self) -> Result<String, &'static str> {
        let space_id = present(self.space_id.as_deref()).ok_or("COMPLETE_DEV_SPACE_ID")?;
        let channel_id = present(self.channel_id.as_deref()).ok_or("COMPLETE_DEV_CHANNEL_ID")?;
        Ok(format!(
            "{}/spaces/{space_id}/channels/{channel_id}/messages",
            self.base_url.trim_end_matches('/'),
        ))
    }

    pub(crate) fn api_key(&self) -> Result<&str, &'static str> {
        present(self.api_key.as_deref()).ok_or("COMPLETE_DEV_API_KEY")
    }
}

impl Default for CompleteDevConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            space_id: None,
            channel_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// The API key never reaches logs.
impl fmt::Debug for CompleteDevConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompleteDevConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("space_id", &self.space_id)
            .field("channel_id", &self.channel_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
