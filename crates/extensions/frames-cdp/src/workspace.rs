//! Chrome as the dialog workspace: one tab per frame.

use std::sync::Arc;

use async_trait::async_trait;
use multiai_core::{FrameContext, FrameError, FrameSpec, WorkspaceBackend};
use tracing::{debug, info};

use crate::frame::CdpFrame;
use crate::manager::{BrowserManager, BrowserManagerConfig};

/// [`WorkspaceBackend`] over a [`BrowserManager`].
pub struct CdpWorkspace {
    manager: Arc<BrowserManager>,
}

impl CdpWorkspace {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self::with_manager(Arc::new(BrowserManager::new(config)))
    }

    pub fn with_manager(manager: Arc<BrowserManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<BrowserManager> {
        &self.manager
    }
}

#[async_trait]
impl WorkspaceBackend for CdpWorkspace {
    async fn open_frame(&self, spec: &FrameSpec) -> Result<Arc<dyn FrameContext>, FrameError> {
        let page_id = self.manager.open_page(&spec.url).await?;
        debug!("Frame {} ({}) is {}", spec.index, spec.display_name, page_id);
        Ok(Arc::new(CdpFrame::new(page_id, self.manager.clone())))
    }

    async fn is_live(&self) -> bool {
        self.manager.has_open_pages().await && self.manager.is_alive().await
    }

    /// Activates the first frame's tab.
    async fn show(&self) -> Result<(), FrameError> {
        if let Some(page_id) = self.manager.page_ids().await.first() {
            self.manager.bring_to_front(page_id).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), FrameError> {
        self.manager.close_all_pages().await?;
        self.manager.close().await?;
        info!("Workspace tabs closed");
        Ok(())
    }
}
