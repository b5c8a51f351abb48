//! Host collaborators: the note editor and user notices.

use std::io;

use tracing::info;

/// The note editor the prompt is taken from.
pub trait Editor: Send {
    /// Selected text, empty when nothing is selected.
    fn selection(&self) -> String;

    /// Whole document text.
    fn document(&self) -> String;

    fn replace_selection(&mut self, replacement: &str) -> io::Result<()>;

    /// Empty the whole document.
    fn clear(&mut self) -> io::Result<()>;
}

/// Short user-facing messages.
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

/// Notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notice(&self, message: &str) {
        info!(target: "notice", "{}", message);
    }
}
