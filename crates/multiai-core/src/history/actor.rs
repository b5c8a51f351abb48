//! Single-writer history store.
//!
//! One task owns the records; [`HistoryStore`] handles talk to it over a channel.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::HistoryOptions;
use super::record::{FrameRef, PromptRecord};
use super::stats::HistoryStats;
use super::storage::HistoryStorage;
use super::sync::{LocalChanges, evict};
use crate::error::HistoryError;

const CHANNEL_CAPACITY: usize = 64;

/// Longest daily series `stats` returns.
pub const MAX_STATS_DAYS: usize = 3660;

type Reply<T> = oneshot::Sender<Result<T, HistoryError>>;

enum HistoryCommand {
    Add {
        content: String,
        frames: Vec<FrameRef>,
        reply: Reply<PromptRecord>,
    },
    Insert {
        record: PromptRecord,
        reply: Reply<()>,
    },
    Get {
        id: String,
        reply: oneshot::Sender<Option<PromptRecord>>,
    },
    List {
        reply: oneshot::Sender<Vec<PromptRecord>>,
    },
    Search {
        query: String,
        favorites_only: bool,
        reply: oneshot::Sender<Vec<PromptRecord>>,
    },
    ToggleFavorite {
        id: String,
        reply: Reply<bool>,
    },
    Edit {
        id: String,
        content: String,
        reply: Reply<PromptRecord>,
    },
    Delete {
        id: String,
        reply: Reply<()>,
    },
    Flush {
        reply: Reply<()>,
    },
    Stats {
        today: NaiveDate,
        days: usize,
        top: usize,
        reply: oneshot::Sender<HistoryStats>,
    },
}

struct HistoryActor {
    /// Oldest first.
    records: Vec<PromptRecord>,
    storage: HistoryStorage,
    max_history: usize,
    auto_save: bool,
    /// Records as last read from or written to the folder, by id.
    synced: HashMap<String, PromptRecord>,
    dirty: BTreeSet<String>,
    full_save: bool,
    last_timestamp: i64,
    rx: mpsc::Receiver<HistoryCommand>,
}

impl HistoryActor {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        if self.full_save || !self.dirty.is_empty() {
            if let Err(e) = self.flush().await {
                error!("Failed to save prompt history on shutdown: {}", e);
            }
        }
        debug!("History writer stopped");
    }

    async fn handle(&mut self, command: HistoryCommand) {
        match command {
            HistoryCommand::Add {
                content,
                frames,
                reply,
            } => {
                let record = self.add(content, frames);
                let result = self.persist().await.map(|_| self.stored(record));
                let _ = reply.send(result);
            }
            HistoryCommand::Insert { record, reply } => {
                self.insert(record);
                let _ = reply.send(self.persist().await);
            }
            HistoryCommand::Get { id, reply } => {
                let _ = reply.send(self.find(&id).cloned());
            }
            HistoryCommand::List { reply } => {
                let _ = reply.send(self.records.iter().rev().cloned().collect());
            }
            HistoryCommand::Search {
                query,
                favorites_only,
                reply,
            } => {
                let hits = self
                    .records
                    .iter()
                    .rev()
                    .filter(|r| !favorites_only || r.favorite)
                    .filter(|r| r.matches(&query))
                    .cloned()
                    .collect();
                let _ = reply.send(hits);
            }
            HistoryCommand::ToggleFavorite { id, reply } => {
                let result = match self.find_mut(&id) {
                    Some(record) => {
                        record.favorite = !record.favorite;
                        let favorite = record.favorite;
                        let month = record.month_key();
                        self.dirty.insert(month);
                        self.persist().await.map(|_| favorite)
                    }
                    None => Err(HistoryError::NotFound(id)),
                };
                let _ = reply.send(result);
            }
            HistoryCommand::Edit { id, content, reply } => {
                let result = match self.find_mut(&id) {
                    Some(record) => {
                        record.content = content;
                        let updated = record.clone();
                        self.dirty.insert(updated.month_key());
                        self.persist().await.map(|_| updated)
                    }
                    None => Err(HistoryError::NotFound(id)),
                };
                let _ = reply.send(result);
            }
            HistoryCommand::Delete { id, reply } => {
                let result = match self.records.iter().position(|r| r.id == id) {
                    Some(pos) => {
                        let removed = self.records.remove(pos);
                        self.dirty.insert(removed.month_key());
                        self.persist().await
                    }
                    None => Err(HistoryError::NotFound(id)),
                };
                let _ = reply.send(result);
            }
            HistoryCommand::Flush { reply } => {
                let _ = reply.send(self.flush().await);
            }
            HistoryCommand::Stats {
                today,
                days,
                top,
                reply,
            } => {
                let _ = reply.send(HistoryStats::compute(&self.records, today, days, top));
            }
        }
    }

    fn find(&self, id: &str) -> Option<&PromptRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut PromptRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Millisecond timestamp, strictly after every earlier one and unused as an id.
    fn next_timestamp(&mut self) -> i64 {
        let ids: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        let mut timestamp = Utc::now().timestamp_millis().max(self.last_timestamp + 1);
        while ids.contains(timestamp.to_string().as_str()) {
            timestamp += 1;
        }
        self.last_timestamp = timestamp;
        timestamp
    }

    fn add(&mut self, content: String, frames: Vec<FrameRef>) -> PromptRecord {
        let record = PromptRecord::new(self.next_timestamp(), content, frames);
        self.dirty.insert(record.month_key());
        self.records.push(record.clone());
        self.evict();
        debug!("Added prompt record {}", record.id);
        record
    }

    fn insert(&mut self, record: PromptRecord) {
        if let Some(pos) = self.records.iter().position(|r| r.id == record.id) {
            let old = self.records.remove(pos);
            self.dirty.insert(old.month_key());
        }
        self.last_timestamp = self.last_timestamp.max(record.timestamp);
        self.dirty.insert(record.month_key());
        let pos = self
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        self.records.insert(pos, record);
        self.evict();
    }

    fn evict(&mut self) {
        let months = evict(&mut self.records, self.max_history);
        self.dirty.extend(months);
    }

    /// `record` as it ended up after a flush; a merge may have moved its id.
    fn stored(&self, record: PromptRecord) -> PromptRecord {
        if self.find(&record.id).is_some_and(|r| r == &record) {
            return record;
        }
        self.records
            .iter()
            .rev()
            .find(|r| r.content == record.content && r.timestamp > record.timestamp)
            .cloned()
            .unwrap_or(record)
    }

    async fn persist(&mut self) -> Result<(), HistoryError> {
        if self.auto_save {
            self.flush().await
        } else {
            Ok(())
        }
    }

    /// Lock the folder, merge in what other writers saved since our last
    /// sync, then rewrite the changed partitions.
    async fn flush(&mut self) -> Result<(), HistoryError> {
        if !self.full_save && self.dirty.is_empty() {
            return Ok(());
        }
        let storage = self.storage.clone();
        let changes = LocalChanges::between(&self.synced, &self.records);
        let full_save = self.full_save;
        let max_history = self.max_history;
        let mut months = self.dirty.clone();

        let merged = tokio::task::spawn_blocking(move || {
            let _lock = storage.lock()?;
            let on_disk = storage.load()?.records;
            let (mut merged, changed) = changes.apply(on_disk);
            months.extend(changed);
            months.extend(evict(&mut merged, max_history));
            if full_save {
                storage.save_all(&merged)?;
            } else {
                storage.save_months(&merged, &months)?;
            }
            Ok::<_, HistoryError>(merged)
        })
        .await
        .map_err(|e| HistoryError::Io(std::io::Error::other(e)))??;

        self.last_timestamp = merged
            .iter()
            .map(|r| r.timestamp)
            .max()
            .unwrap_or(0)
            .max(self.last_timestamp);
        self.synced = merged.iter().map(|r| (r.id.clone(), r.clone())).collect();
        self.records = merged;
        self.full_save = false;
        self.dirty.clear();
        Ok(())
    }
}

/// Cloneable handle to the history writer task.
#[derive(Clone)]
pub struct HistoryStore {
    tx: mpsc::Sender<HistoryCommand>,
}

impl HistoryStore {
    /// Load every history file and start the writer task.
    pub async fn open(options: HistoryOptions) -> Result<Self, HistoryError> {
        let storage = HistoryStorage::new(&options.folder, options.layout);
        let loader = storage.clone();
        let loaded = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| HistoryError::Io(std::io::Error::other(e)))??;

        info!(
            "Prompt history: {} records in {}",
            loaded.records.len(),
            options.folder.display()
        );

        let last_timestamp = loaded.records.iter().map(|r| r.timestamp).max().unwrap_or(0);
        let synced = loaded
            .records
            .iter()
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut actor = HistoryActor {
            records: loaded.records,
            storage,
            max_history: options.max_history,
            auto_save: options.auto_save,
            synced,
            dirty: BTreeSet::new(),
            full_save: loaded.needs_full_save,
            last_timestamp,
            rx,
        };
        let before = actor.records.len();
        actor.evict();
        if actor.records.len() != before {
            actor.full_save = true;
        }
        tokio::spawn(actor.run());

        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> HistoryCommand,
    ) -> Result<T, HistoryError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| HistoryError::ActorGone)?;
        rx.await.map_err(|_| HistoryError::ActorGone)
    }

    /// Record a dispatched prompt.
    pub async fn add(
        &self,
        content: impl Into<String>,
        frames: Vec<FrameRef>,
    ) -> Result<PromptRecord, HistoryError> {
        let content = content.into();
        self.request(|reply| HistoryCommand::Add {
            content,
            frames,
            reply,
        })
        .await?
    }

    /// Store a complete record, replacing any record with the same id.
    pub async fn insert(&self, record: PromptRecord) -> Result<(), HistoryError> {
        self.request(|reply| HistoryCommand::Insert { record, reply })
            .await?
    }

    pub async fn get(&self, id: &str) -> Result<Option<PromptRecord>, HistoryError> {
        let id = id.to_string();
        self.request(|reply| HistoryCommand::Get { id, reply }).await
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<PromptRecord>, HistoryError> {
        self.request(|reply| HistoryCommand::List { reply }).await
    }

    /// Records whose content contains `query` (case-insensitive), newest first.
    pub async fn search(
        &self,
        query: &str,
        favorites_only: bool,
    ) -> Result<Vec<PromptRecord>, HistoryError> {
        let query = query.to_string();
        self.request(|reply| HistoryCommand::Search {
            query,
            favorites_only,
            reply,
        })
        .await
    }

    /// Flip the favorite flag. Returns the new value.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool, HistoryError> {
        let id = id.to_string();
        self.request(|reply| HistoryCommand::ToggleFavorite { id, reply })
            .await?
    }

    pub async fn edit(
        &self,
        id: &str,
        content: impl Into<String>,
    ) -> Result<PromptRecord, HistoryError> {
        let id = id.to_string();
        let content = content.into();
        self.request(|reply| HistoryCommand::Edit { id, content, reply })
            .await?
    }

    pub async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let id = id.to_string();
        self.request(|reply| HistoryCommand::Delete { id, reply })
            .await?
    }

    /// Write pending changes. Needed when `auto_save` is off.
    pub async fn flush(&self) -> Result<(), HistoryError> {
        self.request(|reply| HistoryCommand::Flush { reply }).await?
    }

    pub async fn stats(&self, days: usize, top: usize) -> Result<HistoryStats, HistoryError> {
        self.stats_at(Utc::now().date_naive(), days, top).await
    }

    /// Statistics with the daily series ending at `today`, at most
    /// [`MAX_STATS_DAYS`] long.
    pub async fn stats_at(
        &self,
        today: NaiveDate,
        days: usize,
        top: usize,
    ) -> Result<HistoryStats, HistoryError> {
        let days = days.min(MAX_STATS_DAYS);
        self.request(|reply| HistoryCommand::Stats {
            today,
            days,
            top,
            reply,
        })
        .await
    }
}
