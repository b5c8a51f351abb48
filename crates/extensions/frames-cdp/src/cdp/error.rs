//! Failures talking to the Chrome that hosts the AI tabs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    // HTTP endpoint discovery (`/json/version`, `/json/list`).
    /// Nothing answering on the DevTools endpoint, or it is not Chrome.
    #[error(
        "no DevTools endpoint at {0}; check [browser] debug_port or let multiai launch Chrome"
    )]
    ChromeNotAvailable(String),

    #[error("DevTools HTTP request failed: {0}")]
    Http(String),

    // Browser WebSocket.
    #[error("could not attach to Chrome: {0}")]
    ConnectionFailed(String),

    #[error("DevTools socket error: {0}")]
    WebSocket(String),

    /// The socket closed or the reader task ended; pending calls fail with this.
    #[error("DevTools socket closed")]
    SessionClosed,

    #[error("timed out waiting for Chrome: {0}")]
    Timeout(String),

    /// Chrome answered a command with an error object.
    #[error("Chrome rejected the command ({code}): {message}")]
    Protocol { code: i64, message: String },

    #[error("malformed DevTools message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unexpected DevTools reply: {0}")]
    InvalidResponse(String),

    // Inside an AI tab.
    #[error("tab could not load its site: {0}")]
    NavigationFailed(String),

    /// A page script threw; carries the exception description.
    #[error("page script threw: {0}")]
    JavaScript(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
