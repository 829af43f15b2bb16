//! Tool registry: the exact tool set passed to the model for one turn.
//!
//! The registry is name-keyed and insertion-ordered. Registering a name
//! twice replaces the earlier entry in place, which is how precedence is
//! expressed during assembly: local defaults first, then remote tools,
//! then the file-patch override.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::Validator;
use serde_json::Value;

use crate::error::TurnError;
use crate::traits::{ApplyModel, ControlPlaneConnection, FileStore, TodoSink};
use crate::tools::patch::FilePatchTool;
use crate::tools::todo::TodoListTool;
use crate::types::ToolSpec;

/// Executes one tool with structured JSON arguments.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, arguments: Value) -> Result<Value, TurnError>;
}

/// A tool spec paired with the handler that executes it.
#[derive(Clone)]
pub struct RegisteredTool {
    pub spec: ToolSpec,
    pub handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn new(spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Self {
        Self { spec, handler }
    }
}

/// Name-keyed, insertion-ordered tool set with compiled argument schemas.
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, RegisteredTool>,
    validators: HashMap<String, Validator>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier entry with the same name
    /// in place. The argument schema is compiled eagerly; a schema that
    /// does not compile disables validation for that tool only.
    pub fn register(&mut self, tool: RegisteredTool) {
        let name = tool.spec.name.clone();
        match Validator::new(&tool.spec.input_schema) {
            Ok(validator) => {
                self.validators.insert(name.clone(), validator);
            }
            Err(e) => {
                tracing::warn!(tool = %name, "invalid tool schema, skipping validation: {e}");
                self.validators.remove(&name);
            }
        }
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Wire-ready descriptors in insertion order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec.clone())
            .collect()
    }

    /// Validate arguments against the tool's compiled schema. Tools whose
    /// schema failed to compile accept anything.
    pub fn validate(&self, name: &str, arguments: &Value) -> Result<(), String> {
        let Some(validator) = self.validators.get(name) else {
            return Ok(());
        };
        if validator.is_valid(arguments) {
            return Ok(());
        }
        let mut messages = Vec::new();
        for error in validator.iter_errors(arguments) {
            messages.push(format!("{} at {}", error, error.instance_path));
            if messages.len() >= 3 {
                break;
            }
        }
        Err(format!(
            "Tool arguments failed schema validation: {}",
            messages.join("; ")
        ))
    }
}

/// Handler that forwards execution to a remote control-plane tool.
pub struct RemoteTool {
    connection: Arc<dyn ControlPlaneConnection>,
    name: String,
}

impl RemoteTool {
    pub fn new(connection: Arc<dyn ControlPlaneConnection>, name: impl Into<String>) -> Self {
        Self {
            connection,
            name: name.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for RemoteTool {
    async fn execute(&self, arguments: Value) -> Result<Value, TurnError> {
        self.connection.call_tool(&self.name, arguments).await
    }
}

/// Build the tool set for one turn: the fixed todo tool, every tool the
/// control plane advertises (remote names win on collision), and the
/// file-patch tool when an apply model is configured.
///
/// A failure to fetch the remote tool list fails the whole turn; no
/// partial set is ever used.
pub async fn assemble_registry(
    connection: &Arc<dyn ControlPlaneConnection>,
    todos: Arc<dyn TodoSink>,
    files: Arc<dyn FileStore>,
    apply_model: Option<Arc<dyn ApplyModel>>,
) -> Result<ToolRegistry, TurnError> {
    let mut registry = ToolRegistry::new();
    registry.register(TodoListTool::new(todos).into_registered());

    for spec in connection.tools().await? {
        let handler = Arc::new(RemoteTool::new(connection.clone(), spec.name.clone()));
        registry.register(RegisteredTool::new(spec, handler));
    }

    if let Some(model) = apply_model {
        registry.register(FilePatchTool::new(files, model).into_registered());
    }

    Ok(registry)
}
