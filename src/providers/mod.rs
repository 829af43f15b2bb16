//! Model clients.

pub mod openai;

pub use openai::{OpenAiApplyModel, OpenAiChatModel};
