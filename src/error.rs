//! Error taxonomy for turnkit.
//!
//! `TurnError` mirrors the teacher's `LlmError` taxonomy restricted to
//! this domain. Nothing is swallowed: every failure reaches the caller
//! via the observer-then-return convention in the orchestrator. No
//! retry/backoff lives here — recovery is deliberately left to the
//! layer above.

use thiserror::Error;

/// All failures surfaced by turnkit.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The dev-server control plane rejected or could not serve a request.
    #[error("control-plane error: {0}")]
    ControlPlane(String),

    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// A response body could not be parsed into the expected shape.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The streaming transport broke its contract.
    #[error("stream error: {0}")]
    StreamError(String),

    /// Required configuration was missing or invalid.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A file could not be read.
    #[error("failed to read file '{path}': {message}")]
    FileRead { path: String, message: String },

    /// A file could not be written.
    #[error("failed to write file '{path}': {message}")]
    FileWrite { path: String, message: String },

    /// The model produced no content where content was required.
    #[error("model returned an empty completion")]
    EmptyCompletion,

    /// A tool handler failed.
    #[error("tool '{name}' failed: {message}")]
    ToolError { name: String, message: String },

    /// The turn was cancelled by the caller.
    #[error("turn cancelled")]
    Cancelled,

    /// An invariant was violated inside turnkit.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl TurnError {
    /// Construct a [`TurnError::ControlPlane`].
    pub fn control_plane(message: impl Into<String>) -> Self {
        TurnError::ControlPlane(message.into())
    }

    /// Construct a [`TurnError::ToolError`].
    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        TurnError::ToolError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether this error represents a cancelled turn.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TurnError::Cancelled)
    }
}
