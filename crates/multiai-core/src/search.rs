//! Search-before-send: append related snippets from the vault or history to a prompt.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use multiai_config::SearchMode;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::SearchError;
use crate::history::{HistoryStore, tokenize};

const MAX_TERMS: usize = 8;
const SNIPPET_CHARS: usize = 200;

/// One related snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub source: String,
    pub snippet: String,
    pub score: usize,
}

/// Somewhere to look for related text.
#[async_trait]
pub trait ContextSource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<SearchHit>, SearchError>;
}

fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

fn count_terms(haystack: &str, terms: &[String]) -> usize {
    terms.iter().map(|t| haystack.matches(t.as_str()).count()).sum()
}

/// Markdown files under a vault directory.
pub struct VaultSearch {
    root: PathBuf,
    exclude: Vec<PathBuf>,
}

impl VaultSearch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: Vec::new(),
        }
    }

    /// Skip everything under `path` (the transcript folder, the history folder).
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude.push(path.into());
        self
    }

    fn search_blocking(
        root: &Path,
        exclude: &[PathBuf],
        terms: &[String],
        limit: usize,
    ) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        let files = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !exclude.iter().any(|x| e.path().starts_with(x)))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"));

        for entry in files {
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                debug!("Unreadable vault file {}", entry.path().display());
                continue;
            };
            let lower = content.to_lowercase();
            let score = count_terms(&lower, terms);
            if score == 0 {
                continue;
            }
            let line = content
                .lines()
                .find(|l| {
                    let l = l.to_lowercase();
                    terms.iter().any(|t| l.contains(t.as_str()))
                })
                .unwrap_or_default();
            let source = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            hits.push(SearchHit {
                source,
                snippet: truncate_chars(line, SNIPPET_CHARS),
                score,
            });
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.source.cmp(&b.source)));
        hits.truncate(limit);
        hits
    }
}

#[async_trait]
impl ContextSource for VaultSearch {
    fn name(&self) -> &str {
        "vault"
    }

    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let root = self.root.clone();
        let exclude = self.exclude.clone();
        let terms = terms.to_vec();
        tokio::task::spawn_blocking(move || Self::search_blocking(&root, &exclude, &terms, limit))
            .await
            .map_err(|e| SearchError::Task(e.to_string()))
    }
}

/// Earlier prompts from the history store.
pub struct HistorySearch {
    store: HistoryStore,
}

impl HistorySearch {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContextSource for HistorySearch {
    fn name(&self) -> &str {
        "history"
    }

    async fn search(&self, terms: &[String], limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let records = self.store.list().await?;
        let mut hits: Vec<SearchHit> = records
            .iter()
            .filter_map(|r| {
                let score = count_terms(&r.content.to_lowercase(), terms);
                (score > 0).then(|| SearchHit {
                    source: "history".to_string(),
                    snippet: truncate_chars(&r.content, SNIPPET_CHARS),
                    score,
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Adds a `Context:` section to prompts. Failures leave the prompt unchanged.
pub struct PromptEnricher {
    sources: Vec<Arc<dyn ContextSource>>,
    timeout: Duration,
    max_snippets: usize,
}

impl PromptEnricher {
    pub fn new(sources: Vec<Arc<dyn ContextSource>>, timeout: Duration, max_snippets: usize) -> Self {
        Self {
            sources,
            timeout,
            max_snippets,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Vec::new(), Duration::ZERO, 0)
    }

    /// Sources selected by `mode`.
    pub fn for_mode(
        mode: SearchMode,
        vault: Option<VaultSearch>,
        history: Option<HistoryStore>,
        timeout: Duration,
        max_snippets: usize,
    ) -> Self {
        let mut sources: Vec<Arc<dyn ContextSource>> = Vec::new();
        if mode.uses_vault() {
            if let Some(vault) = vault {
                sources.push(Arc::new(vault));
            }
        }
        if mode.uses_history() {
            match history {
                Some(store) => sources.push(Arc::new(HistorySearch::new(store))),
                None => warn!("Search mode {:?} needs prompt history, which is disabled", mode),
            }
        }
        Self::new(sources, timeout, max_snippets)
    }

    pub fn is_enabled(&self) -> bool {
        !self.sources.is_empty() && self.max_snippets > 0
    }

    /// Distinct search terms of a prompt.
    pub fn query_terms(text: &str) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for token in tokenize(text) {
            if !terms.contains(&token) {
                terms.push(token);
            }
            if terms.len() == MAX_TERMS {
                break;
            }
        }
        terms
    }

    pub async fn enrich(&self, text: &str) -> String {
        if !self.is_enabled() {
            return text.to_string();
        }
        let terms = Self::query_terms(text);
        if terms.is_empty() {
            return text.to_string();
        }

        let searches = self
            .sources
            .iter()
            .map(|source| source.search(&terms, self.max_snippets));
        let results = match tokio::time::timeout(self.timeout, join_all(searches)).await {
            Ok(results) => results,
            Err(_) => {
                warn!("Search-before-send timed out after {:?}", self.timeout);
                return text.to_string();
            }
        };

        let mut hits: Vec<SearchHit> = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(found) => hits.extend(found),
                Err(e) => warn!("Search in {} failed: {}", source.name(), e),
            }
        }
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        let mut seen = Vec::new();
        hits.retain(|h| {
            let fresh = !seen.contains(&h.snippet) && !h.snippet.is_empty();
            if fresh {
                seen.push(h.snippet.clone());
            }
            fresh
        });
        hits.truncate(self.max_snippets);

        if hits.is_empty() {
            debug!("Search-before-send found nothing for {:?}", terms);
            return text.to_string();
        }

        let context = hits
            .iter()
            .map(|h| format!("- [{}] {}", h.source, h.snippet))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\n---\nContext:\n{}", text, context)
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
