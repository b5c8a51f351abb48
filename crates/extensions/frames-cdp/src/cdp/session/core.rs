//! Core session struct and CDP command dispatch.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cdp::client::Connection;
use crate::cdp::error::CdpError;

/// A session attached to a single page/target.
pub struct PageSession {
    /// Target ID.
    pub(super) target_id: String,
    /// Session ID for this target.
    pub(super) session_id: String,
    /// Browser connection (shared with the client).
    pub(super) conn: Arc<Connection>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, conn: Arc<Connection>) -> Self {
        Self {
            target_id,
            session_id,
            conn,
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// False once the tab was closed or the browser connection dropped.
    pub fn is_attached(&self) -> bool {
        !self.conn.is_closed() && !self.conn.is_detached(&self.session_id)
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        if self.conn.is_detached(&self.session_id) {
            return Err(CdpError::SessionClosed);
        }
        self.conn.call(method, params, Some(&self.session_id)).await
    }

    /// Activate the tab and focus its window.
    pub async fn bring_to_front(&self) -> Result<(), CdpError> {
        self.call("Page.bringToFront", None).await?;
        debug!("Brought target {} to front", self.target_id);
        Ok(())
    }
}
