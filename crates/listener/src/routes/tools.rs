//! # Tool Routes
//!
//! - `GET /api/tools` lists the catalog.
//! - `POST /api/tools/{tool_id}` runs the tool's agent chain and streams its
//!   progress as server-sent events.
//!
//! Admission order for generation: identity, rate limit, tool lookup,
//! declared fields, required fields, sanitization, chain resolution. Every
//! rejection happens before the stream opens, so a rejected request never
//! reaches an agent.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nodes::ProgressStream;
use pipeline::{ChainRequest, Inputs, OperationType, ToolDefinition};
use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::Caller;
use crate::error::{rate_limit_headers, ApiError};
use crate::routes::client_ip;
use crate::sse::event_stream;
use crate::state::AppState;

/// Catalog listing and generation routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{tool_id}", post(generate))
}

/// GET /api/tools
async fn list_tools(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let decision = state
        .limiter
        .check(&client_ip(&headers), OperationType::General)
        .into_result(OperationType::General)?;
    let tools: Vec<&ToolDefinition> = state.catalog.iter().map(Arc::as_ref).collect();
    Ok((rate_limit_headers(&decision), Json(tools)).into_response())
}

/// POST /api/tools/{tool_id}
#[instrument(skip_all, fields(%tool_id, caller = %caller.0))]
async fn generate(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    caller: Caller,
    body: Bytes,
) -> Result<Response, ApiError> {
    let decision = state
        .limiter
        .check(caller.0.as_str(), OperationType::ToolGeneration)
        .into_result(OperationType::ToolGeneration)?;

    let tool = state.catalog.get(&tool_id)?;
    let raw = parse_inputs(&body)?;
    tool.check_declared(&raw)?;
    tool.check_required(&raw)?;
    let request = ChainRequest {
        tool_id: Some(tool.id.clone()),
        chain: tool.agent_chain.clone(),
        inputs: state.sanitizer.sanitize_inputs(&raw)?,
    };

    info!(agents = request.chain.len(), "starting document generation");
    let progress = ProgressStream::start(Arc::clone(&state.executor), &state.registry, request)?;
    Ok((rate_limit_headers(&decision), event_stream(progress)).into_response())
}

/// Reads a flat JSON object into ordered inputs.
///
/// Numbers and booleans are kept as their JSON text, `null` counts as
/// absent, and nested values are rejected.
pub(crate) fn parse_inputs(body: &[u8]) -> Result<Inputs, ApiError> {
    let object: indexmap::IndexMap<String, Value> = serde_json::from_slice(body)
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    let mut inputs = Inputs::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                return Err(ApiError::MalformedBody(format!(
                    "field '{key}' must be a string"
                )))
            }
        };
        inputs.insert(key, text);
    }
    Ok(inputs)
}
