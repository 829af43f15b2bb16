//! Streaming event types for a turn in flight.

use crate::error::TurnError;
use crate::types::{Message, ToolCallRecord, ToolResultRecord};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Metadata reported when a stream opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub id: Option<String>,
    pub model: Option<String>,
    pub provider: String,
}

/// Everything one reasoning step produced besides raw text.
///
/// `tool_calls` is ordered as the model emitted the calls; `tool_results`
/// follows the same order. `produced_text` marks steps whose text ran
/// through [`TurnEvent::TextDelta`] so the transcript can insert a
/// separator before the next step's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StepOutcome {
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<ToolResultRecord>,
    pub produced_text: bool,
}

/// Turn streaming event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// Stream opened; fired at most once, before any other event.
    StreamStart { metadata: StreamMetadata },
    /// Incremental text token.
    TextDelta { delta: String },
    /// A reasoning step finished; fired once per step.
    StepFinished { step: StepOutcome },
    /// Stream finished; carries the finalized structured message list.
    StreamEnd { messages: Vec<Message> },
}

/// Stream of turn events.
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnEvent, TurnError>> + Send>>;
