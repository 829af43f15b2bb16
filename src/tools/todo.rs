//! The fixed todo-list tool.
//!
//! Always registered, independent of the control plane: the model keeps
//! a visible plan by replacing the whole list each call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::TurnError;
use crate::registry::{RegisteredTool, ToolHandler};
use crate::traits::TodoSink;
use crate::types::{TodoItem, ToolSpec};

pub const TODO_TOOL_NAME: &str = "update_todo_list";

pub struct TodoListTool {
    sink: Arc<dyn TodoSink>,
}

#[derive(Deserialize)]
struct TodoArgs {
    todos: Vec<TodoItem>,
}

impl TodoListTool {
    pub fn new(sink: Arc<dyn TodoSink>) -> Self {
        Self { sink }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            TODO_TOOL_NAME,
            "Replace the todo list shown to the user with the given items.",
            json!({
                "type": "object",
                "properties": {
                    "todos": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "description": {"type": "string"},
                                "completed": {"type": "boolean"}
                            },
                            "required": ["description", "completed"]
                        }
                    }
                },
                "required": ["todos"]
            }),
        )
    }

    pub fn into_registered(self) -> RegisteredTool {
        RegisteredTool::new(Self::spec(), Arc::new(self))
    }
}

#[async_trait]
impl ToolHandler for TodoListTool {
    async fn execute(&self, arguments: Value) -> Result<Value, TurnError> {
        let args: TodoArgs = serde_json::from_value(arguments)
            .map_err(|e| TurnError::tool(TODO_TOOL_NAME, format!("invalid arguments: {e}")))?;
        let count = args.todos.len();
        self.sink.replace(args.todos).await?;
        Ok(json!({ "count": count }))
    }
}
