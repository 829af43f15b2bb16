//! The turn accumulator.
//!
//! A [`Transcript`] is the single growing text buffer for one turn. It
//! only ever appends: formatted tool-call blocks, formatted tool-result
//! blocks, and literal text tokens. Blocks are separated from prior
//! content by exactly one blank line; text directly after a block (or
//! after a step break) gets the same separator, while consecutive text
//! tokens concatenate as-is.

use std::borrow::Cow;

use serde_json::Value;

/// Tool-result content longer than this many characters is cut.
pub const MAX_RESULT_CHARS: usize = 500;

/// Appended verbatim after truncated tool-result content.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastAppend {
    None,
    Block,
    Text,
}

/// Monotonically growing transcript for one turn.
#[derive(Debug)]
pub struct Transcript {
    buf: String,
    last: LastAppend,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            last: LastAppend::None,
        }
    }

    /// Append a formatted tool-call block.
    pub fn push_tool_call(&mut self, name: &str, arguments: &Value) {
        self.begin_block();
        let args = serde_json::to_string_pretty(arguments)
            .unwrap_or_else(|_| arguments.to_string());
        self.buf.push_str("**Tool Call: ");
        self.buf.push_str(name);
        self.buf.push_str("**\n");
        self.buf.push_str(&args);
        self.last = LastAppend::Block;
    }

    /// Append a formatted tool-result block, truncating long output.
    pub fn push_tool_result(&mut self, name: &str, output: &Value) {
        self.begin_block();
        self.buf.push_str("**Tool Result: ");
        self.buf.push_str(name);
        self.buf.push_str("**\n");
        let rendered = render_output(output);
        self.buf.push_str(&truncate_output(&rendered));
        self.last = LastAppend::Block;
    }

    /// Append a raw text token.
    pub fn push_text(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        if self.last == LastAppend::Block {
            self.buf.push_str("\n\n");
        }
        self.buf.push_str(delta);
        self.last = LastAppend::Text;
    }

    /// Mark a step boundary after a step that produced text, so the next
    /// step's text starts in its own paragraph.
    pub fn end_step(&mut self) {
        if !self.buf.is_empty() {
            self.last = LastAppend::Block;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    fn begin_block(&mut self) {
        if !self.buf.is_empty() {
            self.buf.push_str("\n\n");
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

fn render_output(output: &Value) -> Cow<'_, str> {
    match output {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(
            serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        ),
    }
}

/// Cut `text` to [`MAX_RESULT_CHARS`] characters plus the marker;
/// shorter text passes through verbatim.
fn truncate_output(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_RESULT_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}
