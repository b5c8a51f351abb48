//! # MultiAI Core
//!
//! Fans one prompt out to several AI chat sites and fans their replies back in.
//!
//! ## Components
//!
//! - [`PlatformRegistry`] - Per-site selectors and injection recipes
//! - [`FrameContext`] / [`WorkspaceBackend`] - Browser collaborator seams
//! - [`Dispatcher`] - Concurrent inject + send across live frames
//! - [`Collector`] - Reply scraping with fixed or poll-until-stable policies
//! - [`HistoryStore`] - Single-writer prompt history with monthly partitions
//! - [`DialogRecorder`] - Markdown dialog transcript
//! - [`PromptEnricher`] - Search-before-send context snippets
//! - [`DialogSession`] - Orchestration used by the host commands

pub mod collector;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod history;
pub mod host;
pub mod platform;
pub mod sanitize;
pub mod search;
pub mod session;
pub mod transcript;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Baseline, CollectPolicy, CollectedResponse, Collector};
pub use command::{CommandOutcome, FrameCommand, InsertStrategy};
pub use dispatcher::{
    DispatchFailure, DispatchOptions, DispatchReport, DispatchStatus, Dispatcher, FrameDispatch,
};
pub use error::{DialogError, FrameError, HistoryError, SearchError};
pub use frame::FrameContext;
pub use history::{FrameRef, HistoryOptions, HistoryStats, HistoryStore, PromptRecord};
pub use host::{Editor, LogNotifier, Notifier};
pub use platform::{PlatformConfig, PlatformRegistry};
pub use search::{ContextSource, HistorySearch, PromptEnricher, SearchHit, VaultSearch};
pub use session::{DialogSession, SelectorKind, SessionOptions};
pub use transcript::{DialogRecorder, DocumentStore, FsDocumentStore};
pub use workspace::{FrameSlot, FrameSpec, Workspace, WorkspaceBackend, WorkspaceManager};
