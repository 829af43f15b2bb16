//! Conversion of conversation history into the model wire shape.

use crate::types::{Message, ModelMessage};

/// Flatten prior history plus the new inbound message into model
/// messages: roles are preserved, the text of all `Text` parts is
/// concatenated in order, and non-text parts are dropped. Messages whose
/// flattened text is empty are dropped entirely.
pub fn to_model_messages(history: &[Message], new_message: &Message) -> Vec<ModelMessage> {
    history
        .iter()
        .chain(std::iter::once(new_message))
        .filter_map(|message| {
            let content = message.text();
            if content.is_empty() {
                None
            } else {
                Some(ModelMessage::new(message.role, content))
            }
        })
        .collect()
}
