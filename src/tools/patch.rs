//! The file-patch tool.
//!
//! Applies a described edit to one file by asking the apply model to
//! merge a sparse edit into the original content. Single best-effort
//! call: no retry, no local diffing, no syntax verification — the file
//! is overwritten with whatever the apply model returns.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::TurnError;
use crate::registry::{RegisteredTool, ToolHandler};
use crate::traits::{ApplyModel, FileStore};
use crate::types::{ModelMessage, Role, ToolSpec};

pub const PATCH_TOOL_NAME: &str = "edit_file";

/// Marker the sparse edit uses for unchanged regions.
pub const ELISION_MARKER: &str = "// ... existing code ...";

const APPLY_SYSTEM_PROMPT: &str = "You merge code edits. Given the original file in <code> and a \
sparse edit in <update> that marks unchanged regions with \"// ... existing code ...\", output \
the complete updated file content and nothing else. No code fences, no commentary.";

/// Arguments of one `edit_file` call.
#[derive(Debug, Clone, Deserialize)]
pub struct PatchArgs {
    pub target_file: String,
    pub instructions: String,
    pub code_edit: String,
}

pub struct FilePatchTool {
    files: Arc<dyn FileStore>,
    model: Arc<dyn ApplyModel>,
}

impl FilePatchTool {
    pub fn new(files: Arc<dyn FileStore>, model: Arc<dyn ApplyModel>) -> Self {
        Self { files, model }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            PATCH_TOOL_NAME,
            format!(
                "Edit an existing file. Provide the edit as a sparse snippet that marks \
                 unchanged regions with `{ELISION_MARKER}`."
            ),
            json!({
                "type": "object",
                "properties": {
                    "target_file": {"type": "string"},
                    "instructions": {"type": "string"},
                    "code_edit": {"type": "string"}
                },
                "required": ["target_file", "instructions", "code_edit"]
            }),
        )
    }

    pub fn into_registered(self) -> RegisteredTool {
        RegisteredTool::new(Self::spec(), Arc::new(self))
    }

    /// Apply one edit and return the new file content.
    pub async fn apply(&self, args: &PatchArgs) -> Result<String, TurnError> {
        let original = self.files.read(&args.target_file).await?;

        let prompt = format!(
            "<instructions>{}</instructions>\n<code>{}</code>\n<update>{}</update>",
            args.instructions, original, args.code_edit
        );
        let completion = self
            .model
            .complete(vec![
                ModelMessage::new(Role::System, APPLY_SYSTEM_PROMPT),
                ModelMessage::new(Role::User, prompt),
            ])
            .await?;

        let content = completion
            .content()
            .ok_or(TurnError::EmptyCompletion)?
            .to_string();

        self.files.write(&args.target_file, &content).await?;
        Ok(content)
    }
}

#[async_trait]
impl ToolHandler for FilePatchTool {
    async fn execute(&self, arguments: Value) -> Result<Value, TurnError> {
        let args: PatchArgs = serde_json::from_value(arguments)
            .map_err(|e| TurnError::tool(PATCH_TOOL_NAME, format!("invalid arguments: {e}")))?;
        let content = self.apply(&args).await?;
        Ok(json!({
            "target_file": args.target_file,
            "bytes_written": content.len(),
        }))
    }
}
