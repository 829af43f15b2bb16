//! Shared stubs for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use turnkit::error::TurnError;
use turnkit::registry::ToolHandler;
use turnkit::stream::{TurnEvent, TurnStream};
use turnkit::traits::{
    ApplyModel, ControlPlaneConnection, ControlPlaneConnector, FileStore, StreamingChatModel,
    TodoSink, TurnObserver,
};
use turnkit::types::{
    ChatRequest, Completion, CompletionChoice, CompletionMessage, ModelMessage, TodoItem,
    ToolSpec,
};

/// What a [`ScriptedModel`] saw in its one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub system_prompt: String,
    pub messages: Vec<ModelMessage>,
    pub max_steps: usize,
    pub max_output_tokens: u32,
    pub tool_names: Vec<String>,
}

/// Streaming model that replays a scripted event sequence once.
pub struct ScriptedModel {
    events: Mutex<Option<Vec<Result<TurnEvent, TurnError>>>>,
    seen: Mutex<Option<SeenRequest>>,
}

impl ScriptedModel {
    pub fn new(events: Vec<Result<TurnEvent, TurnError>>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            seen: Mutex::new(None),
        }
    }

    pub fn was_called(&self) -> bool {
        self.seen.lock().unwrap().is_some()
    }

    pub fn seen_request(&self) -> SeenRequest {
        self.seen
            .lock()
            .unwrap()
            .clone()
            .expect("model was not called")
    }
}

#[async_trait]
impl StreamingChatModel for ScriptedModel {
    async fn stream_turn(&self, request: ChatRequest) -> Result<TurnStream, TurnError> {
        *self.seen.lock().unwrap() = Some(SeenRequest {
            system_prompt: request.system_prompt.clone(),
            messages: request.messages.clone(),
            max_steps: request.max_steps,
            max_output_tokens: request.max_output_tokens,
            tool_names: request
                .tools
                .specs()
                .into_iter()
                .map(|spec| spec.name)
                .collect(),
        });
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .expect("stream_turn called twice");
        Ok(Box::pin(futures_util::stream::iter(events)))
    }
}

/// One observer notification, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Update(String),
    Finish,
    Error(String),
}

/// Observer that records every notification in order.
#[derive(Default)]
pub struct RecordingObserver {
    log: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn log(&self) -> Vec<ObserverEvent> {
        self.log.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::Update(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn finish_count(&self) -> usize {
        self.log()
            .iter()
            .filter(|event| matches!(event, ObserverEvent::Finish))
            .count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl TurnObserver for RecordingObserver {
    fn on_step_update(&self, transcript: &str) {
        self.log
            .lock()
            .unwrap()
            .push(ObserverEvent::Update(transcript.to_string()));
    }

    fn on_finish(&self) {
        self.log.lock().unwrap().push(ObserverEvent::Finish);
    }

    fn on_error(&self, error: &TurnError) {
        self.log
            .lock()
            .unwrap()
            .push(ObserverEvent::Error(error.to_string()));
    }
}

/// In-memory control-plane connection with failure switches.
#[derive(Debug, Default)]
pub struct StubConnection {
    pub tools: Vec<ToolSpec>,
    pub fail_tools: bool,
    pub closes: AtomicUsize,
    pub calls: Mutex<Vec<(String, Value)>>,
    pub outputs: Mutex<HashMap<String, Value>>,
}

impl StubConnection {
    pub fn with_tools(tools: Vec<ToolSpec>) -> Self {
        Self {
            tools,
            ..Self::default()
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlaneConnection for StubConnection {
    async fn tools(&self) -> Result<Vec<ToolSpec>, TurnError> {
        if self.fail_tools {
            return Err(TurnError::control_plane("tool list unavailable"));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, TurnError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        let output = self.outputs.lock().unwrap().get(name).cloned();
        Ok(output.unwrap_or_else(|| json!({"echo": arguments})))
    }

    async fn close(&self) -> Result<(), TurnError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out one shared [`StubConnection`].
pub struct StubConnector {
    pub connection: Arc<StubConnection>,
    pub fail_connect: bool,
}

impl StubConnector {
    pub fn new(connection: Arc<StubConnection>) -> Self {
        Self {
            connection,
            fail_connect: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            connection: Arc::new(StubConnection::default()),
            fail_connect: true,
        }
    }
}

#[async_trait]
impl ControlPlaneConnector for StubConnector {
    async fn connect(
        &self,
        _url: &str,
    ) -> Result<Arc<dyn ControlPlaneConnection>, TurnError> {
        if self.fail_connect {
            return Err(TurnError::control_plane("connect refused"));
        }
        Ok(self.connection.clone())
    }
}

/// In-memory file store.
#[derive(Default)]
pub struct MemoryFileStore {
    pub files: Mutex<HashMap<String, String>>,
}

impl MemoryFileStore {
    pub fn with_file(path: &str, contents: &str) -> Self {
        let store = Self::default();
        store
            .files
            .lock()
            .unwrap()
            .insert(path.to_string(), contents.to_string());
        store
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn read(&self, path: &str) -> Result<String, TurnError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| TurnError::FileRead {
                path: path.to_string(),
                message: "No such file or directory".to_string(),
            })
    }

    async fn write(&self, path: &str, contents: &str) -> Result<(), TurnError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

/// Todo sink that drops everything.
pub struct NullTodoSink;

#[async_trait]
impl TodoSink for NullTodoSink {
    async fn replace(&self, _todos: Vec<TodoItem>) -> Result<(), TurnError> {
        Ok(())
    }
}

/// Apply model returning a fixed completion and recording its requests.
#[derive(Default)]
pub struct StubApplyModel {
    pub content: Option<String>,
    pub requests: Mutex<Vec<Vec<ModelMessage>>>,
}

impl StubApplyModel {
    pub fn returning(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Vec<ModelMessage> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("apply model was not called")
    }
}

#[async_trait]
impl ApplyModel for StubApplyModel {
    async fn complete(&self, messages: Vec<ModelMessage>) -> Result<Completion, TurnError> {
        self.requests.lock().unwrap().push(messages);
        Ok(Completion {
            choices: vec![CompletionChoice {
                message: CompletionMessage {
                    content: self.content.clone(),
                },
            }],
        })
    }
}

/// Tool handler backed by a plain function.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    async fn execute(&self, arguments: Value) -> Result<Value, TurnError> {
        Ok((self.0)(arguments))
    }
}
