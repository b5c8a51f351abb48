//! Error types for the dialog core.

use thiserror::Error;

/// Failures reported by a browser frame collaborator.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame is no longer live")]
    NotLive,

    #[error("Script error: {0}")]
    Script(String),

    #[error("Frame timed out: {0}")]
    Timeout(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Prompt history errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt record not found: {0}")]
    NotFound(String),

    #[error("History writer has stopped")]
    ActorGone,
}

/// Search-before-send errors. Never surfaced to the user.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Search task failed: {0}")]
    Task(String),
}

/// Errors of the user-facing dialog operations.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("No AI platform configured")]
    NoPlatformsConfigured,

    #[error("The AI workspace is not open")]
    WorkspaceClosed,

    #[error("Nothing to send")]
    EmptyPrompt,

    #[error("Frame index out of range: {0}")]
    FrameIndexOutOfRange(usize),

    #[error("No {kind} selector set for frame {frame}")]
    SelectorNotSet { frame: usize, kind: String },

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Document error: {0}")]
    Document(#[from] std::io::Error),
}
