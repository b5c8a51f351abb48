//! Fan-out: inject the prompt into every live frame and press send.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use multiai_config::{DispatchConfig, SendType};
use tracing::{debug, error, info, warn};

use crate::command::{CommandOutcome, FrameCommand};
use crate::error::{DialogError, FrameError};
use crate::frame::FrameContext;
use crate::platform::{PlatformConfig, PlatformRegistry};
use crate::sanitize;
use crate::workspace::{FrameSlot, Workspace};

/// Dispatch timing and text handling.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub settle_delay: Duration,
    pub frame_timeout: Option<Duration>,
    pub fullwidth_sanitize: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchOptions {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            frame_timeout: config.frame_timeout(),
            fullwidth_sanitize: config.fullwidth_sanitize,
        }
    }
}

/// Why one frame did not receive the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    InputNotFound,
    SendNotFound,
    Frame(String),
    TimedOut,
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::InputNotFound => write!(f, "input not found"),
            DispatchFailure::SendNotFound => write!(f, "send control not found"),
            DispatchFailure::Frame(message) => write!(f, "frame error: {}", message),
            DispatchFailure::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Failed(DispatchFailure),
    /// No platform matches the frame's current URL.
    Skipped,
}

/// Outcome for one frame.
#[derive(Debug, Clone)]
pub struct FrameDispatch {
    pub index: usize,
    pub display_name: String,
    pub platform: Option<String>,
    /// URL the frame showed when it was dispatched to.
    pub url: Option<String>,
    pub status: DispatchStatus,
}

/// Per-frame outcomes of one dispatch, in workspace order.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub frames: Vec<FrameDispatch>,
}

impl DispatchReport {
    /// Success flags of the frames that matched a platform, in order.
    pub fn successes(&self) -> Vec<bool> {
        self.frames
            .iter()
            .filter(|f| f.status != DispatchStatus::Skipped)
            .map(|f| f.status == DispatchStatus::Sent)
            .collect()
    }

    pub fn any_success(&self) -> bool {
        self.frames.iter().any(|f| f.status == DispatchStatus::Sent)
    }

    pub fn sent_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.status == DispatchStatus::Sent)
            .count()
    }

    /// URLs of the frames that received the prompt.
    pub fn sent_urls(&self) -> Vec<String> {
        self.frames
            .iter()
            .filter(|f| f.status == DispatchStatus::Sent)
            .filter_map(|f| f.url.clone())
            .collect()
    }
}

/// Sends one prompt to every frame of a workspace.
pub struct Dispatcher {
    registry: Arc<PlatformRegistry>,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(registry: Arc<PlatformRegistry>, options: DispatchOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Dispatch `text` to all frames concurrently.
    pub async fn dispatch(
        &self,
        workspace: &Workspace,
        text: &str,
    ) -> Result<DispatchReport, DialogError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DialogError::EmptyPrompt);
        }
        workspace.ensure_live().await?;

        let futures = workspace.slots().iter().map(|slot| self.dispatch_slot(slot, text));
        let frames = join_all(futures).await;
        let report = DispatchReport { frames };

        info!(
            "Dispatched to {}/{} frames",
            report.sent_count(),
            report.successes().len()
        );
        Ok(report)
    }

    async fn dispatch_slot(&self, slot: &FrameSlot, text: &str) -> FrameDispatch {
        let mut result = FrameDispatch {
            index: slot.spec.index,
            display_name: slot.spec.display_name.clone(),
            platform: None,
            url: None,
            status: DispatchStatus::Skipped,
        };

        let url = match slot.context.current_url().await {
            Ok(url) => url,
            Err(e) => {
                error!("Frame {} has no readable URL: {}", slot.spec.index, e);
                result.status = DispatchStatus::Failed(DispatchFailure::Frame(e.to_string()));
                return result;
            }
        };
        let Some(platform) = self.registry.resolve(&url) else {
            debug!("Frame {} at {} matches no platform, skipped", slot.spec.index, url);
            result.url = Some(url);
            return result;
        };
        result.platform = Some(platform.key.clone());
        result.url = Some(url);

        let text = if self.options.fullwidth_sanitize {
            sanitize::fullwidth(text)
        } else {
            text.to_string()
        };

        let run = self.inject_and_send(slot.context.as_ref(), platform, text);
        let outcome = match self.options.frame_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(DispatchFailure::TimedOut)),
            None => run.await,
        };

        result.status = match outcome {
            Ok(()) => {
                debug!("Sent to frame {} ({})", slot.spec.index, platform.key);
                DispatchStatus::Sent
            }
            Err(failure) => {
                warn!("Dispatch to frame {} ({}) failed: {}", slot.spec.index, platform.key, failure);
                DispatchStatus::Failed(failure)
            }
        };
        result
    }

    async fn inject_and_send(
        &self,
        frame: &dyn FrameContext,
        platform: &PlatformConfig,
        text: String,
    ) -> Result<(), DispatchFailure> {
        let inject = FrameCommand::Inject {
            selector: platform.input_selector.clone(),
            insert: platform.insert,
            text,
        };
        match frame.execute(&inject).await.map_err(frame_failure)? {
            CommandOutcome::Done => {}
            CommandOutcome::NotFound => return Err(DispatchFailure::InputNotFound),
            other => {
                return Err(DispatchFailure::Frame(format!(
                    "unexpected inject outcome: {:?}",
                    other
                )));
            }
        }

        tokio::time::sleep(self.options.settle_delay).await;

        let send = send_command(platform);
        match frame.execute(&send).await.map_err(frame_failure)? {
            CommandOutcome::Done => Ok(()),
            CommandOutcome::NotFound => Err(DispatchFailure::SendNotFound),
            other => Err(DispatchFailure::Frame(format!(
                "unexpected send outcome: {:?}",
                other
            ))),
        }
    }
}

/// Click the send control, or press Enter in the input when none is configured.
fn send_command(platform: &PlatformConfig) -> FrameCommand {
    if platform.send_selector.trim().is_empty() {
        FrameCommand::Send {
            selector: platform.input_selector.clone(),
            send: SendType::Enter,
        }
    } else {
        FrameCommand::Send {
            selector: platform.send_selector.clone(),
            send: platform.send_kind,
        }
    }
}

fn frame_failure(e: FrameError) -> DispatchFailure {
    match e {
        FrameError::Timeout(_) => DispatchFailure::TimedOut,
        other => DispatchFailure::Frame(other.to_string()),
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
