//! Markdown dialog transcript.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::Local;
use multiai_config::DialogRecordSettings;
use regex::{Captures, Regex};
use tracing::debug;

use crate::collector::CollectedResponse;

const WAITING_FOR_REPLIES: &str = "Waiting for replies...";

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{(datetime|prompt|response)\}\}").ok());

/// Note vault access. Paths are vault-relative and `/`-separated.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    async fn create_folder(&self, path: &str) -> io::Result<()>;

    async fn read(&self, path: &str) -> io::Result<String>;

    /// Create or overwrite.
    async fn write(&self, path: &str, content: &str) -> io::Result<()>;
}

/// [`DocumentStore`] over a directory on disk.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault path, refusing anything that climbs out of the root.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes the vault: {}", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => tokio::fs::try_exists(full).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn create_folder(&self, path: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(self.resolve(path)?).await
    }

    async fn read(&self, path: &str) -> io::Result<String> {
        tokio::fs::read_to_string(self.resolve(path)?).await
    }

    async fn write(&self, path: &str, content: &str) -> io::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(full, content).await
    }
}

/// Replies as `**name**:\ntext\n`, separated by blank lines.
pub fn render_responses(responses: &[CollectedResponse]) -> String {
    if responses.is_empty() {
        return WAITING_FOR_REPLIES.to_string();
    }
    responses
        .iter()
        .map(|r| format!("**{}**:\n{}\n", r.display_name, r.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill the record template in one pass, so placeholder text inside the
/// prompt or replies is left alone.
pub fn render_record(
    template: &str,
    datetime: &str,
    prompt: &str,
    responses: &[CollectedResponse],
) -> String {
    let response = render_responses(responses);
    let Some(re) = PLACEHOLDER.as_ref() else {
        return template.to_string();
    };
    re.replace_all(template, |caps: &Captures| match &caps[1] {
        "datetime" => datetime.to_string(),
        "prompt" => prompt.to_string(),
        _ => response.clone(),
    })
    .into_owned()
}

/// Appends dialog records to the configured transcript note.
pub struct DialogRecorder {
    store: Arc<dyn DocumentStore>,
    settings: DialogRecordSettings,
}

impl DialogRecorder {
    pub fn new(store: Arc<dyn DocumentStore>, settings: DialogRecordSettings) -> Self {
        Self { store, settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn folder(&self) -> &str {
        self.settings.folder_path.trim().trim_matches('/')
    }

    /// Vault path of the transcript note.
    pub fn record_path(&self) -> String {
        let file = self.settings.file_name.trim();
        match self.folder() {
            "" => file.to_string(),
            folder => format!("{}/{}", folder, file),
        }
    }

    /// Append one record. Returns false when recording is disabled.
    pub async fn append(
        &self,
        prompt: &str,
        responses: &[CollectedResponse],
    ) -> io::Result<bool> {
        if !self.settings.enabled {
            return Ok(false);
        }

        let folder = self.folder();
        if !folder.is_empty() && !self.store.exists(folder).await {
            self.store.create_folder(folder).await?;
        }

        let datetime = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let record = render_record(&self.settings.template, &datetime, prompt, responses);

        let path = self.record_path();
        let content = if self.store.exists(&path).await {
            let existing = self.store.read(&path).await?;
            if existing.trim().is_empty() {
                record
            } else {
                format!("{}\n\n{}", existing.trim_end_matches('\n'), record)
            }
        } else {
            record
        };
        self.store.write(&path, &content).await?;
        debug!("Appended dialog record to {}", path);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
