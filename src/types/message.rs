//! Conversation message types.
//!
//! A [`Message`] is identified by its `id` and is immutable once created;
//! the client side may overwrite a placeholder assistant message that
//! shares an `id` as streaming output arrives (last-write-wins per id),
//! but this crate never mutates a message after construction.

use serde::{Deserialize, Serialize};

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a message body.
///
/// Non-text parts are preserved in the structured message list but are
/// dropped when messages are flattened for a model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    /// Plain text content.
    Text { text: String },
    /// A tool invocation the assistant requested.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// The output produced for a tool invocation.
    ToolResult {
        id: String,
        name: String,
        output: serde_json::Value,
    },
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identity of the message within a conversation.
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Start building a user message with one text part.
    pub fn user(text: impl Into<String>) -> MessageBuilder {
        MessageBuilder::text(Role::User, text)
    }

    /// Start building an assistant message with one text part.
    pub fn assistant(text: impl Into<String>) -> MessageBuilder {
        MessageBuilder::text(Role::Assistant, text)
    }

    /// Start building a system message with one text part.
    pub fn system(text: impl Into<String>) -> MessageBuilder {
        MessageBuilder::text(Role::System, text)
    }

    /// Start building an empty message for the given role.
    pub fn builder(role: Role) -> MessageBuilder {
        MessageBuilder {
            id: None,
            role,
            parts: Vec::new(),
        }
    }

    /// The text of all `Text` parts, concatenated in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let MessagePart::Text { text } = part {
                out.push_str(text);
            }
        }
        out
    }
}

/// Builder for [`Message`]. Generates a v4 UUID id unless one is supplied.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    id: Option<String>,
    role: Role,
    parts: Vec<MessagePart>,
}

impl MessageBuilder {
    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    /// Use an explicit message id instead of a generated one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a part to the message body.
    pub fn part(mut self, part: MessagePart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn build(self) -> Message {
        Message {
            id: self.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            role: self.role,
            parts: self.parts,
        }
    }
}

/// Flattened wire shape sent to model endpoints: role plus one text body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: Role,
    pub content: String,
}

impl ModelMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}
