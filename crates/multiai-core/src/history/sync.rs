//! Merging one store's changes into what other processes wrote meanwhile.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::record::PromptRecord;
use super::storage::sort_records;

/// What one store changed since it last read or wrote the folder.
#[derive(Debug, Default)]
pub(super) struct LocalChanges {
    /// Added or modified records.
    upserts: Vec<PromptRecord>,
    /// Ids known on disk at the last sync.
    known: BTreeSet<String>,
    deletes: Vec<String>,
}

impl LocalChanges {
    pub(super) fn between(synced: &HashMap<String, PromptRecord>, records: &[PromptRecord]) -> Self {
        let upserts = records
            .iter()
            .filter(|r| synced.get(&r.id) != Some(*r))
            .cloned()
            .collect();
        let deletes = synced
            .keys()
            .filter(|id| !records.iter().any(|r| &r.id == *id))
            .cloned()
            .collect();
        Self {
            upserts,
            known: synced.keys().cloned().collect(),
            deletes,
        }
    }

    /// Apply the changes on top of `on_disk`. Returns the merged records,
    /// oldest first, and the months whose partitions changed.
    ///
    /// A record added here whose id was taken on disk by another writer
    /// gets the next free millisecond id.
    pub(super) fn apply(self, on_disk: Vec<PromptRecord>) -> (Vec<PromptRecord>, BTreeSet<String>) {
        let mut by_id: HashMap<String, PromptRecord> =
            on_disk.into_iter().map(|r| (r.id.clone(), r)).collect();
        let mut months = BTreeSet::new();

        for id in self.deletes {
            if let Some(removed) = by_id.remove(&id) {
                months.insert(removed.month_key());
            }
        }

        for mut record in self.upserts {
            let added_here = !self.known.contains(&record.id);
            if added_here && by_id.get(&record.id).is_some_and(|r| r != &record) {
                let taken = record.id.clone();
                while by_id.get(&record.id).is_some_and(|r| r != &record) {
                    record.timestamp += 1;
                    record.id = record.timestamp.to_string();
                }
                debug!("Prompt record id {} taken on disk, stored as {}", taken, record.id);
            }
            months.insert(record.month_key());
            by_id.insert(record.id.clone(), record);
        }

        let mut merged: Vec<PromptRecord> = by_id.into_values().collect();
        sort_records(&mut merged);
        (merged, months)
    }
}

/// Drop the oldest records beyond `max_history`, non-favorites first.
/// `0` keeps everything. Returns the months that lost records.
pub(super) fn evict(records: &mut Vec<PromptRecord>, max_history: usize) -> BTreeSet<String> {
    let mut months = BTreeSet::new();
    if max_history == 0 {
        return months;
    }
    while records.len() > max_history {
        let pos = records.iter().position(|r| !r.favorite).unwrap_or(0);
        let removed = records.remove(pos);
        debug!("Evicted prompt record {}", removed.id);
        months.insert(removed.month_key());
    }
    months
}
