//! On-disk layout of the prompt history.
//!
//! Monthly layout: `<folder>/YYYY-MM.json` plus `YYYY-MM.N.json` segments once a
//! month outgrows the size limit. Legacy layout: one `<folder>/prompt-history.json`.
//! Both layouts are read on load.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

use super::record::PromptRecord;
use crate::error::HistoryError;

pub const LEGACY_FILE: &str = "prompt-history.json";

/// Advisory lock file held while a writer reads, merges and rewrites the folder.
pub const LOCK_FILE: &str = ".lock";

const PARTITION_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Monthly { max_file_size: u64 },
    Single,
}

#[derive(Debug, Serialize, Deserialize)]
struct PartitionFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    month: String,
    records: Vec<PromptRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredFile {
    Partition(PartitionFile),
    Records(Vec<PromptRecord>),
}

impl StoredFile {
    fn into_records(self) -> Vec<PromptRecord> {
        match self {
            StoredFile::Partition(p) => p.records,
            StoredFile::Records(r) => r,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HistoryFile {
    Legacy,
    Segment { month: String, index: usize },
}

fn parse_file_name(name: &str) -> Option<HistoryFile> {
    if name == LEGACY_FILE {
        return Some(HistoryFile::Legacy);
    }
    let stem = name.strip_suffix(".json")?;
    let (month, rest) = stem.split_at_checked(7)?;
    let bytes = month.as_bytes();
    let is_month = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit);
    if !is_month {
        return None;
    }
    let index = match rest {
        "" => 0,
        other => other.strip_prefix('.')?.parse().ok()?,
    };
    Some(HistoryFile::Segment {
        month: month.to_string(),
        index,
    })
}

fn segment_name(month: &str, index: usize) -> String {
    if index == 0 {
        format!("{}.json", month)
    } else {
        format!("{}.{}.json", month, index)
    }
}

/// Exclusive lock on the history folder, released on drop.
pub struct FolderLock {
    file: File,
}

impl Drop for FolderLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Result of reading every history file.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Deduplicated, oldest first.
    pub records: Vec<PromptRecord>,
    /// Files exist that the next save would not rewrite (other layout, duplicates).
    pub needs_full_save: bool,
}

/// Reads and writes history files in one folder.
#[derive(Debug, Clone)]
pub struct HistoryStorage {
    folder: PathBuf,
    layout: Layout,
}

impl HistoryStorage {
    pub fn new(folder: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            folder: folder.into(),
            layout,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Block until no other writer holds the folder.
    pub fn lock(&self) -> Result<FolderLock, HistoryError> {
        fs::create_dir_all(&self.folder)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.folder.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(FolderLock { file })
    }

    fn history_files(&self) -> Result<Vec<(PathBuf, HistoryFile)>, HistoryError> {
        if !self.folder.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.folder)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(kind) = name.to_str().and_then(parse_file_name) else {
                continue;
            };
            if entry.file_type()?.is_file() {
                files.push((entry.path(), kind));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    /// Read every history file. Malformed files are logged and skipped.
    pub fn load(&self) -> Result<Loaded, HistoryError> {
        let mut by_id: HashMap<String, PromptRecord> = HashMap::new();
        let mut needs_full_save = false;
        let mut read = 0usize;

        for (path, kind) in self.history_files()? {
            let foreign = matches!(
                (&kind, self.layout),
                (HistoryFile::Legacy, Layout::Monthly { .. })
                    | (HistoryFile::Segment { .. }, Layout::Single)
            );
            needs_full_save |= foreign;

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    error!("Failed to read history file {}: {}", path.display(), e);
                    continue;
                }
            };
            if content.trim().is_empty() {
                continue;
            }
            let stored: StoredFile = match serde_json::from_str(&content) {
                Ok(stored) => stored,
                Err(e) => {
                    error!("Skipping malformed history file {}: {}", path.display(), e);
                    continue;
                }
            };

            for record in stored.into_records() {
                read += 1;
                if let HistoryFile::Segment { month, .. } = &kind {
                    if *month != record.month_key() {
                        needs_full_save = true;
                    }
                }
                match by_id.get(&record.id) {
                    Some(existing) if existing.timestamp > record.timestamp => {
                        needs_full_save = true;
                    }
                    Some(_) => {
                        needs_full_save = true;
                        by_id.insert(record.id.clone(), record);
                    }
                    None => {
                        by_id.insert(record.id.clone(), record);
                    }
                }
            }
        }

        let mut records: Vec<PromptRecord> = by_id.into_values().collect();
        sort_records(&mut records);
        debug!(
            "Loaded {} history records ({} read) from {}",
            records.len(),
            read,
            self.folder.display()
        );
        Ok(Loaded {
            records,
            needs_full_save,
        })
    }

    /// Rewrite everything and remove files the current layout no longer uses.
    pub fn save_all(&self, records: &[PromptRecord]) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.folder)?;
        match self.layout {
            Layout::Single => {
                let mut sorted = records.to_vec();
                sort_records(&mut sorted);
                atomic_write_json(&self.folder.join(LEGACY_FILE), &sorted)?;
                for (path, kind) in self.history_files()? {
                    if kind != HistoryFile::Legacy {
                        remove_file(&path);
                    }
                }
                Ok(())
            }
            Layout::Monthly { .. } => {
                let mut months: BTreeSet<String> =
                    records.iter().map(PromptRecord::month_key).collect();
                for (path, kind) in self.history_files()? {
                    match kind {
                        HistoryFile::Legacy => remove_file(&path),
                        HistoryFile::Segment { month, .. } => {
                            months.insert(month);
                        }
                    }
                }
                self.save_months(records, &months)
            }
        }
    }

    /// Rewrite the partitions of `months`. Single layout rewrites the one file.
    pub fn save_months(
        &self,
        records: &[PromptRecord],
        months: &BTreeSet<String>,
    ) -> Result<(), HistoryError> {
        let max_file_size = match self.layout {
            Layout::Single => return self.save_all(records),
            Layout::Monthly { max_file_size } => max_file_size,
        };
        fs::create_dir_all(&self.folder)?;

        let mut by_month: BTreeMap<&str, Vec<PromptRecord>> = BTreeMap::new();
        for record in records {
            let month = record.month_key();
            if let Some(month) = months.get(&month) {
                by_month.entry(month.as_str()).or_default().push(record.clone());
            }
        }

        let existing = self.history_files()?;
        for month in months {
            let mut month_records = by_month.remove(month.as_str()).unwrap_or_default();
            sort_records(&mut month_records);
            let segments = split_segments(month_records, max_file_size)?;

            for (index, segment) in segments.iter().enumerate() {
                let file = PartitionFile {
                    version: PARTITION_VERSION,
                    month: month.clone(),
                    records: segment.clone(),
                };
                atomic_write_json(&self.folder.join(segment_name(month, index)), &file)?;
            }
            for (path, kind) in &existing {
                if let HistoryFile::Segment { month: m, index } = kind {
                    if m == month && *index >= segments.len() {
                        remove_file(path);
                    }
                }
            }
        }
        Ok(())
    }
}

pub(super) fn sort_records(records: &mut [PromptRecord]) {
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

/// Greedy split so no segment's serialized records exceed `max_file_size`.
/// A single oversized record still gets its own segment.
fn split_segments(
    records: Vec<PromptRecord>,
    max_file_size: u64,
) -> Result<Vec<Vec<PromptRecord>>, HistoryError> {
    let mut segments: Vec<Vec<PromptRecord>> = Vec::new();
    let mut current: Vec<PromptRecord> = Vec::new();
    let mut current_size = 0u64;

    for record in records {
        let size = serde_json::to_vec_pretty(&record)?.len() as u64 + 8;
        if !current.is_empty() && current_size + size > max_file_size {
            segments.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current_size += size;
        current.push(record);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    Ok(segments)
}

fn remove_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove stale history file {}: {}", path.display(), e);
    }
}

/// Write JSON to a temp file in the target directory, then rename over the target.
pub(crate) fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), HistoryError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    let json = serde_json::to_string_pretty(data)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
