//! Workspace handle: the set of frames opened for one dialog window.

use std::sync::Arc;

use async_trait::async_trait;
use multiai_config::Settings;
use tracing::{debug, error, info, warn};

use crate::error::{DialogError, FrameError};
use crate::frame::FrameContext;

/// What to open for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub index: usize,
    pub display_name: String,
    pub url: String,
}

/// Opens frames and owns the window that hosts them.
#[async_trait]
pub trait WorkspaceBackend: Send + Sync {
    /// Open (or reuse) a frame showing `spec.url`.
    async fn open_frame(&self, spec: &FrameSpec) -> Result<Arc<dyn FrameContext>, FrameError>;

    /// Whether the hosting window still exists.
    async fn is_live(&self) -> bool;

    /// Bring the window to the foreground.
    async fn show(&self) -> Result<(), FrameError>;

    /// Close the window and every frame in it.
    async fn close(&self) -> Result<(), FrameError>;
}

/// An opened frame.
#[derive(Clone)]
pub struct FrameSlot {
    pub spec: FrameSpec,
    pub context: Arc<dyn FrameContext>,
}

impl std::fmt::Debug for FrameSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSlot")
            .field("spec", &self.spec)
            .field("context", &self.context.id())
            .finish()
    }
}

/// Handle to an open workspace.
pub struct Workspace {
    slots: Vec<FrameSlot>,
    backend: Arc<dyn WorkspaceBackend>,
}

impl Workspace {
    pub fn new(slots: Vec<FrameSlot>, backend: Arc<dyn WorkspaceBackend>) -> Self {
        Self { slots, backend }
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    /// Frame by position in the workspace.
    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.iter().find(|s| s.spec.index == index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub async fn is_live(&self) -> bool {
        self.backend.is_live().await
    }

    /// Fail with [`DialogError::WorkspaceClosed`] unless the window is still open.
    pub async fn ensure_live(&self) -> Result<(), DialogError> {
        if self.is_live().await {
            Ok(())
        } else {
            Err(DialogError::WorkspaceClosed)
        }
    }
}

/// Owns at most one [`Workspace`].
pub struct WorkspaceManager {
    backend: Arc<dyn WorkspaceBackend>,
    current: Option<Workspace>,
}

impl WorkspaceManager {
    pub fn new(backend: Arc<dyn WorkspaceBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Focus the live workspace or open a new one from the enabled frames.
    pub async fn open(&mut self, settings: &Settings) -> Result<&Workspace, DialogError> {
        let frames = settings.active_frames();
        if frames.is_empty() {
            return Err(DialogError::NoPlatformsConfigured);
        }

        if self.live().await.is_some() {
            debug!("Workspace already open, bringing it to front");
            self.backend.show().await?;
            return self.current.as_ref().ok_or(DialogError::WorkspaceClosed);
        }

        let mut slots = Vec::with_capacity(frames.len());
        let mut last_error = None;
        for (index, frame) in frames.into_iter().enumerate() {
            let spec = FrameSpec {
                index,
                display_name: frame.display_name.clone(),
                url: frame.url.clone(),
            };
            match self.backend.open_frame(&spec).await {
                Ok(context) => {
                    debug!("Opened frame {} ({}) as {}", index, spec.display_name, context.id());
                    slots.push(FrameSlot { spec, context });
                }
                Err(e) => {
                    error!("Failed to open frame {} ({}): {}", index, spec.display_name, e);
                    last_error = Some(e);
                }
            }
        }

        if slots.is_empty() {
            return Err(last_error
                .map(DialogError::from)
                .unwrap_or(DialogError::NoPlatformsConfigured));
        }

        if let Err(e) = self.backend.show().await {
            warn!("Failed to bring workspace to front: {}", e);
        }
        info!("Workspace opened with {} frames", slots.len());
        let workspace: &Workspace = self
            .current
            .insert(Workspace::new(slots, self.backend.clone()));
        Ok(workspace)
    }

    /// The current workspace, if its window is still open. A dead handle is dropped.
    pub async fn live(&mut self) -> Option<&Workspace> {
        let alive = match &self.current {
            Some(workspace) => workspace.is_live().await,
            None => return None,
        };
        if !alive {
            info!("Workspace window was closed");
            self.current = None;
            return None;
        }
        self.current.as_ref()
    }

    /// The current handle without a liveness check.
    pub fn current(&self) -> Option<&Workspace> {
        self.current.as_ref()
    }

    pub async fn close(&mut self) -> Result<(), DialogError> {
        if self.current.take().is_some() {
            self.backend.close().await?;
            info!("Workspace closed");
        }
        Ok(())
    }
}
