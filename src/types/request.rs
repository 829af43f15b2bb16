//! Streaming chat request type.

use crate::registry::ToolRegistry;
use crate::types::ModelMessage;
use crate::utils::cancel::CancelHandle;

/// Everything a [`StreamingChatModel`](crate::traits::StreamingChatModel)
/// needs for one turn.
///
/// The registry travels with the request because tool execution is the
/// streaming client's job: it runs the step loop, executes registered
/// tools between steps, and reports calls and results as stream events.
pub struct ChatRequest {
    pub system_prompt: String,
    pub messages: Vec<ModelMessage>,
    pub tools: ToolRegistry,
    /// Step budget, including the final response step. Zero means one.
    pub max_steps: usize,
    pub max_output_tokens: u32,
    /// Cooperative cancellation; defaults to a handle that never fires.
    pub cancel: CancelHandle,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, messages: Vec<ModelMessage>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            tools: ToolRegistry::new(),
            max_steps: crate::orchestrator::DEFAULT_MAX_STEPS,
            max_output_tokens: crate::orchestrator::DEFAULT_MAX_OUTPUT_TOKENS,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }
}
