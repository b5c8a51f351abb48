//! A Chrome tab as a dialog frame.

use std::sync::Arc;

use async_trait::async_trait;
use multiai_config::SendType;
use multiai_core::{CommandOutcome, FrameCommand, FrameContext, FrameError};
use serde_json::{Value, json};
use tracing::debug;

use crate::manager::{BrowserError, BrowserManager};
use crate::scripts;

impl From<BrowserError> for FrameError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::NotConnected | BrowserError::PageNotFound(_) => FrameError::NotLive,
            BrowserError::Script(msg) => FrameError::Script(msg),
            BrowserError::Timeout(msg) => FrameError::Timeout(msg),
            other => FrameError::Backend(other.to_string()),
        }
    }
}

/// One page function call standing for a [`FrameCommand`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScriptCall {
    pub function: &'static str,
    pub args: Vec<Value>,
    /// Press Enter in the focused element once the function reports `done`.
    pub press_enter: bool,
}

pub(crate) fn command_call(command: &FrameCommand) -> ScriptCall {
    let (function, args, press_enter) = match command {
        FrameCommand::Inject {
            selector,
            insert,
            text,
        } => (
            scripts::INJECT,
            vec![json!(selector), json!(insert.as_str()), json!(text)],
            false,
        ),
        FrameCommand::Send {
            selector,
            send: SendType::Click,
        } => (scripts::SEND_CLICK, vec![json!(selector)], false),
        FrameCommand::Send {
            selector,
            send: SendType::Enter,
        } => (scripts::FOCUS, vec![json!(selector)], true),
        FrameCommand::ReadLast {
            selector,
            visible_only,
        } => (scripts::READ_LAST, vec![json!(selector), json!(visible_only)], false),
        FrameCommand::Highlight {
            selector,
            duration_ms,
        } => (scripts::HIGHLIGHT, vec![json!(selector), json!(duration_ms)], false),
    };
    ScriptCall {
        function,
        args,
        press_enter,
    }
}

/// Map a page function's return value back to a [`CommandOutcome`].
pub(crate) fn interpret_outcome(
    command: &FrameCommand,
    value: &Value,
) -> Result<CommandOutcome, FrameError> {
    let unexpected = || {
        FrameError::Script(format!(
            "unexpected {} result: {}",
            command.name(),
            value
        ))
    };

    match command {
        FrameCommand::Inject { .. } | FrameCommand::Send { .. } => match value.as_str() {
            Some("done") => Ok(CommandOutcome::Done),
            Some("not_found") => Ok(CommandOutcome::NotFound),
            _ => Err(unexpected()),
        },
        FrameCommand::ReadLast { .. } => match value {
            Value::Null => Ok(CommandOutcome::Text(None)),
            Value::String(text) => Ok(CommandOutcome::Text(Some(text.clone()))),
            _ => Err(unexpected()),
        },
        FrameCommand::Highlight { .. } => value
            .as_u64()
            .map(|n| CommandOutcome::Matched(n as usize))
            .ok_or_else(unexpected),
    }
}

/// A tab tracked by the [`BrowserManager`].
pub struct CdpFrame {
    page_id: String,
    manager: Arc<BrowserManager>,
}

impl CdpFrame {
    pub fn new(page_id: impl Into<String>, manager: Arc<BrowserManager>) -> Self {
        Self {
            page_id: page_id.into(),
            manager,
        }
    }
}

#[async_trait]
impl FrameContext for CdpFrame {
    fn id(&self) -> &str {
        &self.page_id
    }

    async fn current_url(&self) -> Result<String, FrameError> {
        Ok(self.manager.get_url(&self.page_id).await?)
    }

    async fn execute(&self, command: &FrameCommand) -> Result<CommandOutcome, FrameError> {
        let call = command_call(command);
        debug!(
            "Running {} in {} (selector {})",
            command.name(),
            self.page_id,
            command.selector()
        );

        let value = self
            .manager
            .call_document_function(&self.page_id, call.function, call.args)
            .await?;
        let outcome = interpret_outcome(command, &value)?;

        if call.press_enter && outcome == CommandOutcome::Done {
            self.manager.press_key(&self.page_id, "Enter").await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
