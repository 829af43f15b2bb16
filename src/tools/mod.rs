//! Built-in tools: the fixed todo-list tool and the file-patch tool.

pub mod patch;
pub mod todo;

pub use patch::{ELISION_MARKER, FilePatchTool, PATCH_TOOL_NAME, PatchArgs};
pub use todo::{TODO_TOOL_NAME, TodoListTool};
