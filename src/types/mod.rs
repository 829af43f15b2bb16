//! Core types shared across the crate.

mod completion;
mod message;
mod request;
mod tools;

pub use completion::{Completion, CompletionChoice, CompletionMessage};
pub use message::{Message, MessageBuilder, MessagePart, ModelMessage, Role};
pub use request::ChatRequest;
pub use tools::{TodoItem, ToolCallRecord, ToolResultRecord, ToolSpec};
