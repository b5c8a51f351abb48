//! Browser frame collaborator.

use async_trait::async_trait;

use crate::command::{CommandOutcome, FrameCommand};
use crate::error::FrameError;

/// One live embedded browser context bound to an AI site.
#[async_trait]
pub trait FrameContext: Send + Sync {
    /// Backend identifier of the frame (tab/target id).
    fn id(&self) -> &str;

    /// URL the frame currently shows.
    async fn current_url(&self) -> Result<String, FrameError>;

    /// Run one structured command inside the frame.
    async fn execute(&self, command: &FrameCommand) -> Result<CommandOutcome, FrameError>;
}
