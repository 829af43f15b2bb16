//! OpenAI-compatible model clients.
//!
//! Two clients against the `/chat/completions` wire format:
//! [`OpenAiChatModel`] streams a full turn over SSE and owns the
//! tool-execution step loop, and [`OpenAiApplyModel`] performs the
//! one-shot completion the file-patch tool needs. Both work with any
//! OpenAI-compatible endpoint via [`ModelConfig::base_url`].

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::ModelConfig;
use crate::error::TurnError;
use crate::registry::ToolRegistry;
use crate::stream::{StepOutcome, StreamMetadata, TurnEvent, TurnStream};
use crate::traits::{ApplyModel, StreamingChatModel};
use crate::types::{
    ChatRequest, Completion, Message, MessagePart, ModelMessage, Role, ToolCallRecord,
    ToolResultRecord,
};

/// One SSE chunk of a streaming chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    id: Option<String>,
    model: Option<String>,
    choices: Option<Vec<ChunkChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    index: Option<usize>,
    id: Option<String>,
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// A tool call being reassembled from deltas.
#[derive(Debug, Default, Clone)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

fn merge_tool_call_delta(pending: &mut Vec<PendingToolCall>, delta: ToolCallDelta) {
    let index = delta.index.unwrap_or(0);
    while pending.len() <= index {
        pending.push(PendingToolCall::default());
    }
    let slot = &mut pending[index];
    if let Some(id) = delta.id
        && !id.is_empty()
    {
        slot.id = id;
    }
    if let Some(function) = delta.function {
        if let Some(name) = function.name
            && !name.is_empty()
        {
            slot.name = name;
        }
        if let Some(arguments) = function.arguments {
            slot.arguments.push_str(&arguments);
        }
    }
}

/// Parse accumulated argument text; malformed JSON falls back to the raw
/// string so the failure is visible in the transcript instead of lost.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn tool_result_content(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn ensure_not_cancelled(cancel: &crate::utils::cancel::CancelHandle) -> Result<(), TurnError> {
    if cancel.is_cancelled() {
        Err(TurnError::Cancelled)
    } else {
        Ok(())
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, TurnError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(TurnError::HttpError(format!(
        "HTTP error {}: {}",
        status.as_u16(),
        error_text
    )))
}

/// Streaming chat model over the OpenAI-compatible SSE wire format.
#[derive(Clone)]
pub struct OpenAiChatModel {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: ModelConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn wire_tools(tools: &ToolRegistry) -> Vec<Value> {
        tools
            .specs()
            .into_iter()
            .map(|spec| {
                json!({
                    "type": "function",
                    "function": {
                        "name": spec.name,
                        "description": spec.description,
                        "parameters": spec.input_schema,
                    }
                })
            })
            .collect()
    }
}

#[async_trait]
impl StreamingChatModel for OpenAiChatModel {
    async fn stream_turn(&self, request: ChatRequest) -> Result<TurnStream, TurnError> {
        let this = self.clone();
        let stream = async_stream::try_stream! {
            let tool_specs = Self::wire_tools(&request.tools);
            let mut wire_messages: Vec<Value> =
                Vec::with_capacity(request.messages.len() + 1);
            wire_messages.push(json!({
                "role": Role::System,
                "content": request.system_prompt,
            }));
            for ModelMessage { role, content } in &request.messages {
                wire_messages.push(json!({"role": role, "content": content}));
            }

            let mut turn_messages: Vec<Message> = Vec::new();
            let mut started = false;
            let max_steps = request.max_steps.max(1);

            'steps: for step_index in 0..max_steps {
                ensure_not_cancelled(&request.cancel)?;

                let mut body = json!({
                    "model": &this.config.model,
                    "messages": &wire_messages,
                    "stream": true,
                    "max_tokens": request.max_output_tokens,
                });
                if !tool_specs.is_empty() {
                    body["tools"] = Value::Array(tool_specs.clone());
                }

                let response = this
                    .http
                    .post(format!("{}/chat/completions", this.config.base_url))
                    .bearer_auth(this.config.key())
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| TurnError::HttpError(format!("Failed to send request: {e}")))?;
                let response = error_for_status(response).await?;

                let mut events = response.bytes_stream().eventsource();
                let mut step_text = String::new();
                let mut pending_calls: Vec<PendingToolCall> = Vec::new();

                loop {
                    let mut cancelled = false;
                    let item = tokio::select! {
                        _ = request.cancel.cancelled() => { cancelled = true; None }
                        item = events.next() => item,
                    };
                    if cancelled {
                        ensure_not_cancelled(&request.cancel)?;
                    }
                    let Some(item) = item else { break };
                    let event = item
                        .map_err(|e| TurnError::StreamError(format!("SSE parsing error: {e}")))?;
                    if event.data.trim() == "[DONE]" {
                        break;
                    }
                    if event.data.trim().is_empty() {
                        continue;
                    }
                    let chunk: ChatCompletionChunk = serde_json::from_str(&event.data)
                        .map_err(|e| {
                            TurnError::ParseError(format!("Failed to parse stream event: {e}"))
                        })?;
                    if !started {
                        started = true;
                        yield TurnEvent::StreamStart {
                            metadata: StreamMetadata {
                                id: chunk.id.clone(),
                                model: chunk.model.clone(),
                                provider: "openai".to_string(),
                            },
                        };
                    }
                    for choice in chunk.choices.unwrap_or_default() {
                        let Some(delta) = choice.delta else { continue };
                        if let Some(content) = delta.content
                            && !content.is_empty()
                        {
                            step_text.push_str(&content);
                            yield TurnEvent::TextDelta { delta: content };
                        }
                        for tool_call in delta.tool_calls.unwrap_or_default() {
                            merge_tool_call_delta(&mut pending_calls, tool_call);
                        }
                    }
                }

                let produced_text = !step_text.is_empty();

                if pending_calls.is_empty() {
                    if produced_text {
                        turn_messages.push(Message::assistant(step_text.clone()).build());
                    }
                    yield TurnEvent::StepFinished {
                        step: StepOutcome {
                            tool_calls: Vec::new(),
                            tool_results: Vec::new(),
                            produced_text,
                        },
                    };
                    break 'steps;
                }

                let calls: Vec<ToolCallRecord> = pending_calls
                    .iter()
                    .map(|pending| ToolCallRecord {
                        id: if pending.id.is_empty() {
                            uuid::Uuid::new_v4().to_string()
                        } else {
                            pending.id.clone()
                        },
                        name: pending.name.clone(),
                        arguments: parse_arguments(&pending.arguments),
                    })
                    .collect();

                let mut results: Vec<ToolResultRecord> = Vec::with_capacity(calls.len());
                for call in &calls {
                    let output = match request.tools.get(&call.name) {
                        None => json!({"error": "unknown_tool", "name": call.name}),
                        Some(tool) => {
                            if let Err(reason) =
                                request.tools.validate(&call.name, &call.arguments)
                            {
                                json!({"error": "invalid_args", "reason": reason})
                            } else {
                                match tool.handler.execute(call.arguments.clone()).await {
                                    Ok(value) => value,
                                    Err(e) => {
                                        tracing::warn!(tool = %call.name, error = %e, "tool execution failed");
                                        json!({"error": "tool_failed", "message": e.to_string()})
                                    }
                                }
                            }
                        }
                    };
                    results.push(ToolResultRecord {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        output,
                    });
                }

                wire_messages.push(json!({
                    "role": "assistant",
                    "content": if produced_text { Value::String(step_text.clone()) } else { Value::Null },
                    "tool_calls": calls
                        .iter()
                        .zip(pending_calls.iter())
                        .map(|(call, pending)| json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": pending.arguments,
                            }
                        }))
                        .collect::<Vec<_>>(),
                }));
                for result in &results {
                    wire_messages.push(json!({
                        "role": "tool",
                        "tool_call_id": result.id,
                        "content": tool_result_content(&result.output),
                    }));
                }

                let mut builder = Message::builder(Role::Assistant);
                if produced_text {
                    builder = builder.part(MessagePart::Text { text: step_text.clone() });
                }
                for call in &calls {
                    builder = builder.part(MessagePart::ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    });
                }
                for result in &results {
                    builder = builder.part(MessagePart::ToolResult {
                        id: result.id.clone(),
                        name: result.name.clone(),
                        output: result.output.clone(),
                    });
                }
                turn_messages.push(builder.build());

                tracing::debug!(step = step_index, tools = calls.len(), "step finished");
                yield TurnEvent::StepFinished {
                    step: StepOutcome {
                        tool_calls: calls,
                        tool_results: results,
                        produced_text,
                    },
                };
            }

            yield TurnEvent::StreamEnd { messages: turn_messages };
        };
        Ok(Box::pin(stream))
    }
}

/// Non-streaming completion client for the apply model.
#[derive(Clone)]
pub struct OpenAiApplyModel {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiApplyModel {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: ModelConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl ApplyModel for OpenAiApplyModel {
    async fn complete(&self, messages: Vec<ModelMessage>) -> Result<Completion, TurnError> {
        let body = json!({
            "model": &self.config.model,
            "messages": messages
                .iter()
                .map(|m| json!({"role": m.role, "content": m.content}))
                .collect::<Vec<_>>(),
            "stream": false,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(self.config.key())
            .json(&body)
            .send()
            .await
            .map_err(|e| TurnError::HttpError(format!("Failed to send request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TurnError::HttpError(format!(
                "HTTP error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        response
            .json::<Completion>()
            .await
            .map_err(|e| TurnError::ParseError(format!("invalid completion response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_parses_content_delta() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"chatcmpl-1","model":"gpt-4o-mini","choices":[{"delta":{"content":"Hi"}}]}"#,
        )
        .unwrap();
        let delta = chunk.choices.unwrap().remove(0).delta.unwrap();
        assert_eq!(delta.content.as_deref(), Some("Hi"));
        assert_eq!(chunk.id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn tool_call_deltas_merge_by_index() {
        let mut pending = Vec::new();
        merge_tool_call_delta(
            &mut pending,
            serde_json::from_str(
                r#"{"index":0,"id":"call_1","function":{"name":"echo","arguments":"{\"te"}}"#,
            )
            .unwrap(),
        );
        merge_tool_call_delta(
            &mut pending,
            serde_json::from_str(r#"{"index":0,"function":{"arguments":"xt\":1}"}}"#).unwrap(),
        );

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "call_1");
        assert_eq!(pending[0].name, "echo");
        assert_eq!(parse_arguments(&pending[0].arguments), json!({"text": 1}));
    }

    #[test]
    fn malformed_arguments_fall_back_to_raw_string() {
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(
            parse_arguments("{not json"),
            Value::String("{not json".to_string())
        );
    }

    #[test]
    fn string_tool_results_are_sent_raw() {
        assert_eq!(tool_result_content(&json!("plain text")), "plain text");
        assert_eq!(tool_result_content(&json!({"ok": true})), r#"{"ok":true}"#);
    }
}
