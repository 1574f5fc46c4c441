//! [`AgentClient`] implementation over the complete.dev messages endpoint.

use async_trait::async_trait;
use pipeline::{AgentCallError, AgentClient, AgentRequest};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::config::CompleteDevConfig;

/// Upstream bodies longer than this are cut before logging.
const MAX_LOGGED_BODY_CHARS: usize = 2_000;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageBody<'a> {
    content: String,
    system_context: &'a str,
}

/// complete.dev agent provider.
///
/// Performs exactly one POST per [`AgentClient::send`]; retries are left to
/// whoever resubmits the chain.
pub struct CompleteDevClient {
    config: CompleteDevConfig,
    client: reqwest::Client,
}

impl CompleteDevClient {
    /// Creates a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: CompleteDevConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Creates a client over a shared `reqwest::Client`.
    #[must_use]
    pub fn with_client(config: CompleteDevConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl AgentClient for CompleteDevClient {
    fn ensure_configured(&self) -> Result<(), AgentCallError> {
        self.config
            .api_key()
            .and_then(|_| self.config.messages_url())
            .map(drop)
            .map_err(|missing| AgentCallError::NotConfigured { missing })
    }

    #[instrument(skip_all, fields(agent_tag = request.agent_tag))]
    async fn send(&self, request: AgentRequest<'_>) -> Result<String, AgentCallError> {
        let not_configured = |missing| AgentCallError::NotConfigured { missing };
        let api_key = self.config.api_key().map_err(not_configured)?;
        let url = self.config.messages_url().map_err(not_configured)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            AgentCallError::Transport {
                message: format!("invalid API key header: {e}"),
            }
        })?;

        let body = MessageBody {
            content: format!("{} {}", request.agent_tag, request.prompt),
            system_context: request.system_prompt,
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, bearer)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentCallError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AgentCallError::Transport {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let logged: String = text.chars().take(MAX_LOGGED_BODY_CHARS).collect();
            error!(status = status.as_u16(), body = %logged, "complete.dev API error");
            return Err(AgentCallError::Status {
                status: status.as_u16(),
            });
        }

        let reply: Value =
            serde_json::from_str(&text).map_err(|e| AgentCallError::InvalidBody {
                message: e.to_string(),
            })?;
        let content = reply_text(&reply).ok_or(AgentCallError::EmptyReply)?;
        debug!(reply_chars = content.len(), "agent replied");
        Ok(content.to_string())
    }
}

/// `reply.content`, else `message.content`; blank text counts as absent.
fn reply_text(reply: &Value) -> Option<&str> {
    ["/reply/content", "/message/content"]
        .into_iter()
        .filter_map(|pointer| reply.pointer(pointer).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
}
