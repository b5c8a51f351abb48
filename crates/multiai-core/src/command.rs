//! Structured commands executed inside a frame.
//!
//! Selectors and text travel as data; backends never splice them into script source.

use multiai_config::{InputType, SendType};
use serde::{Deserialize, Serialize};

/// How text is put into a site's chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertStrategy {
    /// Select all, delete, then `insertText` editing command.
    EditingCommand,
    /// Synthetic paste event carrying the text as clipboard data.
    Paste,
    /// Native `value` setter followed by an `input` event.
    NativeValue,
    /// Replace children with one text node, then `input` and `change` events.
    TextNode,
}

impl InsertStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertStrategy::EditingCommand => "editing_command",
            InsertStrategy::Paste => "paste",
            InsertStrategy::NativeValue => "native_value",
            InsertStrategy::TextNode => "text_node",
        }
    }
}

impl From<InputType> for InsertStrategy {
    fn from(input: InputType) -> Self {
        match input {
            InputType::ContentEditable => InsertStrategy::EditingCommand,
            InputType::Textarea | InputType::Input => InsertStrategy::NativeValue,
        }
    }
}

/// A command for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameCommand {
    /// Locate the input, focus it, clear it and insert `text`.
    Inject {
        selector: String,
        insert: InsertStrategy,
        text: String,
    },
    /// Click the send control, or press Enter in it.
    Send { selector: String, send: SendType },
    /// Text of the last element matching `selector` in document order.
    ReadLast { selector: String, visible_only: bool },
    /// Outline every match for `duration_ms`.
    Highlight { selector: String, duration_ms: u64 },
}

impl FrameCommand {
    pub fn selector(&self) -> &str {
        match self {
            FrameCommand::Inject { selector, .. }
            | FrameCommand::Send { selector, .. }
            | FrameCommand::ReadLast { selector, .. }
            | FrameCommand::Highlight { selector, .. } => selector,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FrameCommand::Inject { .. } => "inject",
            FrameCommand::Send { .. } => "send",
            FrameCommand::ReadLast { .. } => "read_last",
            FrameCommand::Highlight { .. } => "highlight",
        }
    }
}

/// Result of a [`FrameCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    NotFound,
    Text(Option<String>),
    Matched(usize),
}
