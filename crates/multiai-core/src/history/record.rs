//! Prompt history records.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::url_host;

/// A frame a prompt was sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    pub url: String,
}

impl FrameRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Lowercased host, or the raw URL when it does not parse.
    pub fn host(&self) -> String {
        url_host(&self.url).unwrap_or_else(|| self.url.clone())
    }
}

/// One dispatched prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: String,
    pub content: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub frames: Vec<FrameRef>,
    #[serde(default)]
    pub favorite: bool,
}

impl PromptRecord {
    pub fn new(timestamp: i64, content: impl Into<String>, frames: Vec<FrameRef>) -> Self {
        Self {
            id: timestamp.to_string(),
            content: content.into(),
            timestamp,
            frames,
            favorite: false,
        }
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Partition key, `YYYY-MM` in UTC.
    pub fn month_key(&self) -> String {
        let dt = self.datetime();
        format!("{:04}-{:02}", dt.year(), dt.month())
    }

    /// Case-insensitive substring match on the content.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.content.to_lowercase().contains(&query)
    }
}
