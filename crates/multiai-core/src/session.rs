//! Dialog session: the operations behind the host commands.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use multiai_config::{Config, Settings};
use tracing::{info, warn};

use crate::collector::{Baseline, CollectPolicy, CollectedResponse, Collector};
use crate::command::{CommandOutcome, FrameCommand};
use crate::dispatcher::{DispatchOptions, DispatchReport, Dispatcher};
use crate::error::DialogError;
use crate::history::{FrameRef, HistoryOptions, HistoryStore};
use crate::host::{Editor, Notifier};
use crate::platform::PlatformRegistry;
use crate::search::{PromptEnricher, VaultSearch};
use crate::transcript::{DialogRecorder, DocumentStore};
use crate::workspace::{WorkspaceBackend, WorkspaceManager};

const HIGHLIGHT_MS: u64 = 2_000;

/// Which configured selector to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Input,
    Send,
    Response,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Input => "input",
            SelectorKind::Send => "send",
            SelectorKind::Response => "response",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(SelectorKind::Input),
            "send" => Ok(SelectorKind::Send),
            "response" | "ai_response" | "airesponse" => Ok(SelectorKind::Response),
            other => Err(format!("unknown selector kind: {}", other)),
        }
    }
}

/// Runtime knobs taken from the TOML config.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub dispatch: DispatchOptions,
    pub collect: CollectPolicy,
    pub search_timeout: Duration,
    pub max_snippets: usize,
    pub vault: PathBuf,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dispatch: DispatchOptions::from(&config.dispatch),
            collect: CollectPolicy::from(&config.collector),
            search_timeout: Duration::from_millis(config.search.timeout_ms),
            max_snippets: config.search.max_snippets,
            vault: config.paths.vault.clone(),
        }
    }
}

pub struct DialogSession {
    settings: Settings,
    registry: Arc<PlatformRegistry>,
    workspace: WorkspaceManager,
    dispatcher: Dispatcher,
    collector: Collector,
    recorder: DialogRecorder,
    enricher: PromptEnricher,
    history: Option<HistoryStore>,
    notifier: Arc<dyn Notifier>,
    last_prompt: Option<String>,
    baseline: Baseline,
}

impl DialogSession {
    /// Build the session and open the prompt history when it is enabled.
    pub async fn new(
        settings: Settings,
        options: SessionOptions,
        backend: Arc<dyn WorkspaceBackend>,
        documents: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, DialogError> {
        let registry = Arc::new(PlatformRegistry::from_settings(&settings));

        let history_options =
            HistoryOptions::from_settings(&settings.prompt_history_settings, &options.vault);
        let history = if settings.prompt_history_settings.enabled {
            Some(HistoryStore::open(history_options.clone()).await?)
        } else {
            None
        };

        let vault = settings.search_mode.uses_vault().then(|| {
            VaultSearch::new(&options.vault)
                .exclude(history_options.folder.clone())
                .exclude(options.vault.join(settings.dialog_record.folder_path.trim_matches('/')))
        });
        let enricher = PromptEnricher::for_mode(
            settings.search_mode,
            vault,
            history.clone(),
            options.search_timeout,
            options.max_snippets,
        );

        info!(
            "Dialog session ready: {} platforms, search mode {:?}",
            registry.len(),
            settings.search_mode
        );

        Ok(Self {
            recorder: DialogRecorder::new(documents, settings.dialog_record.clone()),
            dispatcher: Dispatcher::new(registry.clone(), options.dispatch),
            collector: Collector::new(registry.clone(), options.collect),
            workspace: WorkspaceManager::new(backend),
            registry,
            settings,
            enricher,
            history,
            notifier,
            last_prompt: None,
            baseline: Baseline::default(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub fn history(&self) -> Option<&HistoryStore> {
        self.history.as_ref()
    }

    /// Baseline taken before the last dispatch.
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Open or focus the workspace. Returns the number of frames.
    pub async fn open_workspace(&mut self) -> Result<usize, DialogError> {
        match self.workspace.open(&self.settings).await {
            Ok(workspace) => Ok(workspace.len()),
            Err(DialogError::NoPlatformsConfigured) => {
                self.notifier.notice("No AI platform configured");
                Err(DialogError::NoPlatformsConfigured)
            }
            Err(e) => {
                self.notifier
                    .notice(&format!("Failed to open the AI workspace: {}", e));
                Err(e)
            }
        }
    }

    pub async fn close_workspace(&mut self) -> Result<(), DialogError> {
        self.workspace.close().await
    }

    /// Write pending prompt history. Call before the process exits, the
    /// history writer does not outlive the runtime.
    pub async fn shutdown(self) -> Result<(), DialogError> {
        if let Some(history) = &self.history {
            history.flush().await?;
        }
        info!("Dialog session closed");
        Ok(())
    }

    /// Dispatch the explicit text, else the editor selection, else the whole note.
    /// On success the used selection (or the note) is cleared.
    pub async fn send_from_editor(
        &mut self,
        editor: &mut dyn Editor,
        explicit: Option<&str>,
    ) -> Result<DispatchReport, DialogError> {
        enum Source {
            Explicit,
            Selection,
            Document,
        }

        let (text, source) = match explicit.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => (text.to_string(), Source::Explicit),
            None => {
                let selection = editor.selection();
                if selection.trim().is_empty() {
                    (editor.document(), Source::Document)
                } else {
                    (selection, Source::Selection)
                }
            }
        };

        let report = self.send_text(&text).await?;
        if report.any_success() {
            let cleared = match source {
                Source::Explicit => Ok(()),
                Source::Selection => editor.replace_selection(""),
                Source::Document => editor.clear(),
            };
            if let Err(e) = cleared {
                warn!("Failed to clear the sent text from the editor: {}", e);
            }
        }
        Ok(report)
    }

    /// Record, enrich and dispatch one prompt.
    pub async fn send_text(&mut self, text: &str) -> Result<DispatchReport, DialogError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            self.notifier.notice("Nothing to send");
            return Err(DialogError::EmptyPrompt);
        }
        let Some(workspace) = self.workspace.live().await else {
            self.notifier.notice("Open the AI workspace first");
            return Err(DialogError::WorkspaceClosed);
        };

        if let Err(e) = self.recorder.append(prompt, &[]).await {
            warn!("Failed to append dialog record: {}", e);
            self.notifier.notice("Failed to save dialog record");
        }

        let baseline = self.collector.snapshot(workspace).await;
        let enriched = self.enricher.enrich(prompt).await;

        let report = match self.dispatcher.dispatch(workspace, &enriched).await {
            Ok(report) => report,
            Err(e) => {
                self.notifier.notice("Send failed");
                return Err(e);
            }
        };

        if let Some(history) = &self.history {
            let frames = report
                .frames
                .iter()
                .filter(|f| f.platform.is_some())
                .filter_map(|f| f.url.clone())
                .map(FrameRef::new)
                .collect();
            if let Err(e) = history.add(prompt, frames).await {
                warn!("Failed to record prompt history: {}", e);
            }
        }

        if report.any_success() {
            self.notifier
                .notice(&format!("Sent to {} AI platforms", report.sent_count()));
        } else {
            self.notifier.notice("Send failed");
        }

        self.last_prompt = Some(prompt.to_string());
        self.baseline = baseline;
        Ok(report)
    }

    /// Collect the replies to the last dispatch and append them to the transcript.
    pub async fn collect(&mut self) -> Result<Vec<CollectedResponse>, DialogError> {
        let Some(workspace) = self.workspace.live().await else {
            self.notifier.notice("Open the AI workspace first");
            return Err(DialogError::WorkspaceClosed);
        };

        let responses = self.collector.collect(workspace, &self.baseline).await?;
        if responses.is_empty() {
            self.notifier.notice("No replies collected");
            return Ok(responses);
        }

        let prompt = match &self.last_prompt {
            Some(prompt) => prompt.clone(),
            None => self.latest_prompt().await.unwrap_or_default(),
        };
        if let Err(e) = self.recorder.append(&prompt, &responses).await {
            warn!("Failed to append replies to the dialog record: {}", e);
            self.notifier.notice("Failed to save dialog record");
        }

        self.notifier
            .notice(&format!("Collected {} replies", responses.len()));
        Ok(responses)
    }

    async fn latest_prompt(&self) -> Option<String> {
        let history = self.history.as_ref()?;
        match history.list().await {
            Ok(records) => records.into_iter().next().map(|r| r.content),
            Err(e) => {
                warn!("Failed to read prompt history: {}", e);
                None
            }
        }
    }

    /// Outline the elements one selector of one frame matches for two seconds.
    pub async fn test_selector(
        &mut self,
        frame_index: usize,
        kind: SelectorKind,
    ) -> Result<usize, DialogError> {
        let Some(workspace) = self.workspace.live().await else {
            self.notifier.notice("Open the AI workspace first");
            return Err(DialogError::WorkspaceClosed);
        };
        let slot = workspace
            .slot(frame_index)
            .ok_or(DialogError::FrameIndexOutOfRange(frame_index))?;

        let url = slot.context.current_url().await?;
        let selector = self
            .registry
            .resolve(&url)
            .map(|p| match kind {
                SelectorKind::Input => p.input_selector.clone(),
                SelectorKind::Send => p.send_selector.clone(),
                SelectorKind::Response => p.response_selector.clone(),
            })
            .unwrap_or_default();
        if selector.trim().is_empty() {
            self.notifier
                .notice(&format!("No {} selector set for this frame", kind));
            return Err(DialogError::SelectorNotSet {
                frame: frame_index,
                kind: kind.to_string(),
            });
        }

        let command = FrameCommand::Highlight {
            selector: selector.clone(),
            duration_ms: HIGHLIGHT_MS,
        };
        let count = match slot.context.execute(&command).await {
            Ok(CommandOutcome::Matched(count)) => count,
            Ok(_) => 0,
            Err(e) => {
                self.notifier
                    .notice(&format!("Selector test failed: {}", e));
                return Err(e.into());
            }
        };

        self.notifier.notice(&format!(
            "Found {} element(s) for {} selector {}",
            count, kind, selector
        ));
        Ok(count)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
