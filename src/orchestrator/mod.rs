//! Turn orchestration.
//!
//! [`run_turn`] executes exactly one conversational turn: it opens a
//! control-plane connection, assembles the tool set, drives one
//! streaming model call, merges tool calls, tool results, and text
//! tokens into a single transcript with incremental observer
//! notifications, and returns the transcript plus the structured
//! message list. The caller owns persistence and broadcast.
//!
//! One invocation is one async call chain; the transcript is owned by
//! the invocation and never shared. Concurrent turns for the same
//! conversation are not coordinated here — callers gate on their own
//! stream-status flag.

mod transcript;

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::Instrument;

use crate::convert::to_model_messages;
use crate::error::TurnError;
use crate::registry::assemble_registry;
use crate::stream::TurnEvent;
use crate::traits::{
    ApplyModel, ControlPlaneConnection, ControlPlaneConnector, FileStore, StreamingChatModel,
    TodoSink, TurnObserver,
};
use crate::types::{ChatRequest, Message};
use crate::utils::cancel::CancelHandle;

pub use transcript::{MAX_RESULT_CHARS, TRUNCATION_MARKER, Transcript};

/// Default step budget, including the final response step.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Default output-token ceiling.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 64_000;

/// System prompt used when the caller supplies none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an app-building assistant. You modify the \
user's app by calling the available tools, keep the todo list current as you work, and explain \
what you changed in plain language.";

/// Injected collaborators for turn execution.
///
/// Construct once at bootstrap and share across turns; every dependency
/// is explicit so each can be substituted in tests. The apply model is
/// optional — when absent, the file-patch tool is not registered.
#[derive(Clone)]
pub struct TurnDeps {
    pub model: Arc<dyn StreamingChatModel>,
    pub connector: Arc<dyn ControlPlaneConnector>,
    pub files: Arc<dyn FileStore>,
    pub todos: Arc<dyn TodoSink>,
    pub apply_model: Option<Arc<dyn ApplyModel>>,
}

/// Per-turn options.
#[derive(Clone)]
pub struct TurnOptions {
    /// Step budget (default 100).
    pub max_steps: usize,
    /// Output-token ceiling (default 64000).
    pub max_output_tokens: u32,
    /// Overrides [`DEFAULT_SYSTEM_PROMPT`] when set.
    pub system_prompt: Option<String>,
    /// Cooperative cancellation handle.
    pub cancel: Option<CancelHandle>,
    /// Progress and outcome notifications.
    pub observer: Option<Arc<dyn TurnObserver>>,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            system_prompt: None,
            cancel: None,
            observer: None,
        }
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    /// The full merged transcript.
    pub text: String,
    /// The finalized structured message list for persistence.
    pub messages: Vec<Message>,
}

/// Execute one conversational turn.
///
/// On success the observer's `on_finish` fires after the last
/// `on_step_update` and before this function returns. On failure
/// `on_error` fires with the original error, which is then returned
/// unwrapped; the partial transcript is discarded. The control-plane
/// connection opened at entry is closed on every exit path.
pub async fn run_turn(
    deps: &TurnDeps,
    app_id: &str,
    control_plane_url: &str,
    new_message: Message,
    history: Vec<Message>,
    options: TurnOptions,
) -> Result<TurnOutput, TurnError> {
    let observer = options.observer.clone();
    let span = tracing::info_span!("turn", app = %app_id);
    let result = run_turn_inner(deps, control_plane_url, new_message, history, options)
        .instrument(span)
        .await;

    if let Some(observer) = &observer {
        match &result {
            Ok(_) => observer.on_finish(),
            Err(e) => observer.on_error(e),
        }
    }
    result
}

async fn run_turn_inner(
    deps: &TurnDeps,
    control_plane_url: &str,
    new_message: Message,
    history: Vec<Message>,
    options: TurnOptions,
) -> Result<TurnOutput, TurnError> {
    let connection = deps.connector.connect(control_plane_url).await?;

    let result = drive_turn(deps, &connection, new_message, history, &options).await;

    // Cleanup runs on every exit path, including setup failures past
    // connect and cancellation. Close failures must not mask the turn's
    // own result.
    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "failed to close control-plane connection");
    }

    result
}

async fn drive_turn(
    deps: &TurnDeps,
    connection: &Arc<dyn ControlPlaneConnection>,
    new_message: Message,
    history: Vec<Message>,
    options: &TurnOptions,
) -> Result<TurnOutput, TurnError> {
    let tools = assemble_registry(
        connection,
        deps.todos.clone(),
        deps.files.clone(),
        deps.apply_model.clone(),
    )
    .await?;
    tracing::debug!(tools = tools.len(), "assembled tool registry");

    let request = ChatRequest {
        system_prompt: options
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        messages: to_model_messages(&history, &new_message),
        tools,
        max_steps: options.max_steps,
        max_output_tokens: options.max_output_tokens,
        cancel: options.cancel.clone().unwrap_or_default(),
    };

    let mut stream = deps.model.stream_turn(request).await?;
    let mut transcript = Transcript::new();
    let mut final_messages: Option<Vec<Message>> = None;

    while let Some(event) = stream.next().await {
        match event? {
            TurnEvent::StreamStart { metadata } => {
                tracing::debug!(model = ?metadata.model, provider = %metadata.provider, "stream started");
            }
            TurnEvent::TextDelta { delta } => {
                if !delta.is_empty() {
                    transcript.push_text(&delta);
                    notify(options, transcript.as_str());
                }
            }
            TurnEvent::StepFinished { step } => {
                for call in &step.tool_calls {
                    transcript.push_tool_call(&call.name, &call.arguments);
                    notify(options, transcript.as_str());
                }
                for result in &step.tool_results {
                    transcript.push_tool_result(&result.name, &result.output);
                    notify(options, transcript.as_str());
                }
                if step.produced_text {
                    transcript.end_step();
                }
            }
            TurnEvent::StreamEnd { messages } => {
                final_messages = Some(messages);
            }
        }
    }

    let messages = final_messages
        .ok_or_else(|| TurnError::StreamError("stream closed before completion".to_string()))?;

    Ok(TurnOutput {
        text: transcript.into_string(),
        messages,
    })
}

fn notify(options: &TurnOptions, transcript: &str) {
    if let Some(observer) = &options.observer {
        observer.on_step_update(transcript);
    }
}
