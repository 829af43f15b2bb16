//! JSON-over-HTTP control-plane client.
//!
//! Protocol:
//! - `POST {base}/v1/sessions` -> `{"session_id": "..."}`
//! - `GET {base}/v1/tools` -> `{"tools": [ToolSpec, ...]}`
//! - `POST {base}/v1/tools/{name}/calls` with `{"session_id", "arguments"}`
//!   -> `{"output": ...}`
//! - `DELETE {base}/v1/sessions/{id}`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::TurnError;
use crate::traits::{ControlPlaneConnection, ControlPlaneConnector};
use crate::types::ToolSpec;

/// Connector for JSON-over-HTTP control planes.
#[derive(Debug, Clone, Default)]
pub struct HttpControlPlane {
    client: reqwest::Client,
}

impl HttpControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a shared HTTP client (connection pooling across turns).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct ToolListResponse {
    tools: Vec<ToolSpec>,
}

#[derive(Deserialize)]
struct ToolCallResponse {
    output: Value,
}

#[async_trait]
impl ControlPlaneConnector for HttpControlPlane {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<Arc<dyn ControlPlaneConnection>, TurnError> {
        let base_url = url.trim_end_matches('/').to_string();
        let response = self
            .client
            .post(format!("{base_url}/v1/sessions"))
            .send()
            .await
            .map_err(|e| TurnError::control_plane(format!("connect failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TurnError::control_plane(format!(
                "connect failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| TurnError::ParseError(format!("invalid session response: {e}")))?;

        tracing::debug!(session = %session.session_id, "control-plane session opened");
        Ok(Arc::new(HttpControlPlaneConnection {
            client: self.client.clone(),
            base_url,
            session_id: session.session_id,
            closed: AtomicBool::new(false),
        }))
    }
}

/// One open control-plane session.
#[derive(Debug)]
pub struct HttpControlPlaneConnection {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
    closed: AtomicBool,
}

#[async_trait]
impl ControlPlaneConnection for HttpControlPlaneConnection {
    async fn tools(&self) -> Result<Vec<ToolSpec>, TurnError> {
        let response = self
            .client
            .get(format!("{}/v1/tools", self.base_url))
            .send()
            .await
            .map_err(|e| TurnError::control_plane(format!("tool list fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TurnError::control_plane(format!(
                "tool list fetch failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        let list: ToolListResponse = response
            .json()
            .await
            .map_err(|e| TurnError::ParseError(format!("invalid tool list: {e}")))?;
        Ok(list.tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, TurnError> {
        let response = self
            .client
            .post(format!("{}/v1/tools/{name}/calls", self.base_url))
            .json(&json!({
                "session_id": self.session_id,
                "arguments": arguments,
            }))
            .send()
            .await
            .map_err(|e| TurnError::control_plane(format!("tool call '{name}' failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TurnError::control_plane(format!(
                "tool call '{name}' failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        let call: ToolCallResponse = response
            .json()
            .await
            .map_err(|e| TurnError::ParseError(format!("invalid tool call response: {e}")))?;
        Ok(call.output)
    }

    async fn close(&self) -> Result<(), TurnError> {
        // Cleanup runs on every exit path; only the first close talks to
        // the server.
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let response = self
            .client
            .delete(format!(
                "{}/v1/sessions/{}",
                self.base_url, self.session_id
            ))
            .send()
            .await
            .map_err(|e| TurnError::control_plane(format!("close failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TurnError::control_plane(format!(
                "close failed: HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}
