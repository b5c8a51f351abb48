//! Prompt history: records, storage layout, single-writer store, statistics.

use std::path::{Path, PathBuf};

use multiai_config::PromptHistorySettings;

mod actor;
mod record;
mod stats;
mod storage;
mod sync;

pub use actor::{HistoryStore, MAX_STATS_DAYS};
pub use record::{FrameRef, PromptRecord};
pub use stats::{HistoryStats, tokenize};
pub use storage::{FolderLock, HistoryStorage, LEGACY_FILE, LOCK_FILE, Layout, Loaded};

/// Where and how the history is kept.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub folder: PathBuf,
    pub layout: Layout,
    pub max_history: usize,
    pub auto_save: bool,
}

impl HistoryOptions {
    /// Resolve a relative `newStorageFolder` under `vault`.
    pub fn from_settings(settings: &PromptHistorySettings, vault: &Path) -> Self {
        let folder = Path::new(&settings.new_storage_folder);
        let folder = if folder.is_absolute() {
            folder.to_path_buf()
        } else {
            vault.join(folder)
        };
        let layout = if settings.use_new_storage {
            Layout::Monthly {
                max_file_size: settings.max_file_size,
            }
        } else {
            Layout::Single
        };
        Self {
            folder,
            layout,
            max_history: settings.max_history,
            auto_save: settings.auto_save,
        }
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
