//! Collaborator seams.
//!
//! The orchestrator touches the outside world only through these traits:
//! a streaming chat model, a one-shot apply model, a control plane
//! advertising remote tools, a file store, and a todo sink. Each has a
//! concrete implementation in this crate and a trivially substitutable
//! surface for tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TurnError;
use crate::stream::TurnStream;
use crate::types::{ChatRequest, Completion, ModelMessage, TodoItem, ToolSpec};

/// A streaming chat model that owns the step loop.
///
/// Implementations execute registered tools between steps and report
/// calls and results via `StepFinished` events. When the request's
/// cancel handle fires, the stream yields [`TurnError::Cancelled`] and
/// stops; the orchestrator adds no timeout logic of its own.
#[async_trait]
pub trait StreamingChatModel: Send + Sync {
    async fn stream_turn(&self, request: ChatRequest) -> Result<TurnStream, TurnError>;
}

/// One-shot, non-streaming completion model used by the file-patch tool.
#[async_trait]
pub trait ApplyModel: Send + Sync {
    async fn complete(&self, messages: Vec<ModelMessage>) -> Result<Completion, TurnError>;
}

/// Opens control-plane connections.
#[async_trait]
pub trait ControlPlaneConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<Arc<dyn ControlPlaneConnection>, TurnError>;
}

/// An open control-plane connection, scoped to exactly one turn.
///
/// Opened at turn entry and closed on every exit path; `close` must be
/// idempotent because cleanup runs unconditionally.
#[async_trait]
pub trait ControlPlaneConnection: Send + Sync + std::fmt::Debug {
    /// The tools this control plane advertises.
    async fn tools(&self) -> Result<Vec<ToolSpec>, TurnError>;

    /// Execute one advertised tool remotely.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, TurnError>;

    async fn close(&self) -> Result<(), TurnError>;
}

/// Text file storage for the patch tool.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Read a file. Fails with [`TurnError::FileRead`] carrying the
    /// underlying error text.
    async fn read(&self, path: &str) -> Result<String, TurnError>;

    /// Write a file, replacing its content in full.
    async fn write(&self, path: &str, contents: &str) -> Result<(), TurnError>;
}

/// Receives the authoritative todo list whenever the model updates it.
#[async_trait]
pub trait TodoSink: Send + Sync {
    async fn replace(&self, todos: Vec<TodoItem>) -> Result<(), TurnError>;
}

/// Progress and outcome notifications for one turn.
///
/// All methods default to no-ops. `on_step_update` may fire many times
/// per second (once per appended transcript block and once per text
/// token); implementations must be cheap or buffer internally.
pub trait TurnObserver: Send + Sync {
    /// Fired with the full transcript after every change. The transcript
    /// grows monotonically within one turn.
    fn on_step_update(&self, _transcript: &str) {}

    /// Fired exactly once on success, after the last `on_step_update`
    /// and before the orchestrator returns.
    fn on_finish(&self) {}

    /// Fired exactly once on failure with the original error, which the
    /// orchestrator then returns unwrapped.
    fn on_error(&self, _error: &TurnError) {}
}
