use super::*;
use std::sync::Mutex;

use crate::command::CommandOutcome;
use crate::testing::{Behaviour, FakeBackend, FakeFrame};
use crate::transcript::FsDocumentStore;

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

struct FakeEditor {
    document: String,
    selection: String,
}

impl Editor for FakeEditor {
    fn selection(&self) -> String {
        self.selection.clone()
    }

    fn document(&self) -> String {
        self.document.clone()
    }

    fn replace_selection(&mut self, replacement: &str) -> std::io::Result<()> {
        self.document = self.document.replacen(&self.selection, replacement, 1);
        self.selection.clear();
        Ok(())
    }

    fn clear(&mut self) -> std::io::Result<()> {
        self.document.clear();
        Ok(())
    }
}

struct Harness {
    session: DialogSession,
    backend: Arc<FakeBackend>,
    notifier: Arc<RecordingNotifier>,
    vault: tempfile::TempDir,
}

/// ChatGPT succeeds, Kimi cannot find its input.
async fn harness(settings: Settings) -> Harness {
    let vault = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::new());
    backend.prepare(
        "https://chatgpt.com",
        Arc::new(FakeFrame::new("gpt", "https://chatgpt.com/").with_reply("GPT answer").with_matches(1)),
    );
    backend.prepare(
        "https://kimi.moonshot.cn",
        Arc::new(
            FakeFrame::new("kimi", "https://kimi.moonshot.cn/")
                .on_inject(Behaviour::Outcome(CommandOutcome::NotFound)),
        ),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let options = SessionOptions {
        dispatch: DispatchOptions {
            settle_delay: Duration::ZERO,
            frame_timeout: Some(Duration::from_secs(1)),
            fullwidth_sanitize: false,
        },
        collect: CollectPolicy::Fixed {
            delay: Duration::ZERO,
        },
        search_timeout: Duration::from_secs(1),
        max_snippets: 3,
        vault: vault.path().to_path_buf(),
    };
    let session = DialogSession::new(
        settings,
        options,
        backend.clone(),
        Arc::new(FsDocumentStore::new(vault.path())),
        notifier.clone(),
    )
    .await
    .unwrap();
    Harness {
        session,
        backend,
        notifier,
        vault,
    }
}

fn two_frames() -> Settings {
    let mut settings = Settings::default();
    settings.frame_count = 2;
    settings
}

fn transcript(h: &Harness) -> String {
    std::fs::read_to_string(h.vault.path().join("AI Dialogs/AI Dialogs.md")).unwrap()
}

#[test]
fn test_selector_kind_parse() {
    assert_eq!("input".parse::<SelectorKind>().unwrap(), SelectorKind::Input);
    assert_eq!("Response".parse::<SelectorKind>().unwrap(), SelectorKind::Response);
    assert!("footer".parse::<SelectorKind>().is_err());
}

#[tokio::test]
async fn test_open_with_no_platforms() {
    let mut settings = Settings::default();
    for frame in &mut settings.frames {
        frame.enabled = false;
    }
    let mut h = harness(settings).await;

    let result = h.session.open_workspace().await;
    assert!(matches!(result, Err(DialogError::NoPlatformsConfigured)));
    assert_eq!(h.backend.opened_count(), 0);
    assert_eq!(h.notifier.notices(), vec!["No AI platform configured".to_string()]);
}

#[tokio::test]
async fn test_send_requires_open_workspace() {
    let mut h = harness(two_frames()).await;
    let result = h.session.send_text("hello").await;
    assert!(matches!(result, Err(DialogError::WorkspaceClosed)));
    assert_eq!(h.notifier.notices(), vec!["Open the AI workspace first".to_string()]);
}

#[tokio::test]
async fn test_send_from_selection() {
    let mut h = harness(two_frames()).await;
    assert_eq!(h.session.open_workspace().await.unwrap(), 2);

    let mut editor = FakeEditor {
        document: "intro\nhello\noutro".to_string(),
        selection: "hello".to_string(),
    };
    let report = h.session.send_from_editor(&mut editor, None).await.unwrap();

    assert_eq!(report.successes(), vec![true, false]);
    assert!(report.any_success());
    assert_eq!(editor.document, "intro\n\noutro");
    assert!(h.notifier.notices().contains(&"Sent to 1 AI platforms".to_string()));

    let history = h.session.history().unwrap().list().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[0].frames.len(), 2);

    let record = transcript(&h);
    assert!(record.contains("### Prompt\nhello"));
    assert!(record.contains("Waiting for replies..."));
}

#[tokio::test]
async fn test_send_whole_document_when_nothing_selected() {
    let mut h = harness(two_frames()).await;
    h.session.open_workspace().await.unwrap();

    let mut editor = FakeEditor {
        document: "the whole note".to_string(),
        selection: String::new(),
    };
    h.session.send_from_editor(&mut editor, None).await.unwrap();
    assert!(editor.document.is_empty());
}

#[tokio::test]
async fn test_explicit_text_leaves_editor_alone() {
    let mut h = harness(two_frames()).await;
    h.session.open_workspace().await.unwrap();

    let mut editor = FakeEditor {
        document: "keep me".to_string(),
        selection: "keep".to_string(),
    };
    h.session
        .send_from_editor(&mut editor, Some("typed prompt"))
        .await
        .unwrap();
    assert_eq!(editor.document, "keep me");
    let history = h.session.history().unwrap().list().await.unwrap();
    assert_eq!(history[0].content, "typed prompt");
}

#[tokio::test]
async fn test_empty_editor() {
    let mut h = harness(two_frames()).await;
    h.session.open_workspace().await.unwrap();

    let mut editor = FakeEditor {
        document: "  \n ".to_string(),
        selection: String::new(),
    };
    let result = h.session.send_from_editor(&mut editor, None).await;
    assert!(matches!(result, Err(DialogError::EmptyPrompt)));
    assert!(h.notifier.notices().contains(&"Nothing to send".to_string()));
}

#[tokio::test]
async fn test_total_failure_keeps_editor_text() {
    let mut settings = two_frames();
    settings.frames.remove(0);
    settings.frame_count = 1;
    let mut h = harness(settings).await;
    h.session.open_workspace().await.unwrap();

    let mut editor = FakeEditor {
        document: "hello".to_string(),
        selection: String::new(),
    };
    let report = h.session.send_from_editor(&mut editor, None).await.unwrap();
    assert!(!report.any_success());
    assert_eq!(editor.document, "hello");
    assert_eq!(
        h.notifier.notices().last().map(String::as_str),
        Some("Send failed")
    );
}

#[tokio::test]
async fn test_collect_ignores_reply_seen_before_send() {
    let mut h = harness(two_frames()).await;
    h.session.open_workspace().await.unwrap();
    h.session.send_text("question").await.unwrap();

    // The existing reply was captured as baseline, so it is not new.
    let responses = h.session.collect().await.unwrap();
    assert!(responses.is_empty());
    assert_eq!(
        h.notifier.notices().last().map(String::as_str),
        Some("No replies collected")
    );
}

#[tokio::test]
async fn test_collect_without_send_uses_history_prompt() {
    let mut h = harness(two_frames()).await;
    h.session
        .history()
        .unwrap()
        .add("remembered prompt", vec![])
        .await
        .unwrap();
    h.session.open_workspace().await.unwrap();

    let responses = h.session.collect().await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].text, "GPT answer");
    assert_eq!(responses[0].display_name, "ChatGPT");

    let record = transcript(&h);
    assert!(record.contains("remembered prompt"));
    assert!(record.contains("**ChatGPT**:\nGPT answer\n"));
    assert_eq!(
        h.notifier.notices().last().map(String::as_str),
        Some("Collected 1 replies")
    );
}

#[tokio::test]
async fn test_collect_after_window_closed() {
    let mut h = harness(two_frames()).await;
    h.session.open_workspace().await.unwrap();
    h.backend.set_live(false);

    let result = h.session.collect().await;
    assert!(matches!(result, Err(DialogError::WorkspaceClosed)));
}

#[tokio::test]
async fn test_selector_highlight() {
    let mut h = harness(two_frames()).await;
    h.session.open_workspace().await.unwrap();

    let count = h.session.test_selector(0, SelectorKind::Response).await.unwrap();
    assert_eq!(count, 1);
    assert!(h
        .notifier
        .notices()
        .last()
        .unwrap()
        .starts_with("Found 1 element(s) for response selector"));

    let result = h.session.test_selector(7, SelectorKind::Input).await;
    assert!(matches!(result, Err(DialogError::FrameIndexOutOfRange(7))));
}

#[tokio::test]
async fn test_selector_on_unknown_site() {
    let mut h = harness(two_frames()).await;
    let stray = Arc::new(FakeFrame::new("stray", "https://chatgpt.com/"));
    h.backend.prepare("https://chatgpt.com", stray.clone());
    h.session.open_workspace().await.unwrap();
    stray.set_url("https://example.com/");

    let result = h.session.test_selector(0, SelectorKind::Send).await;
    assert!(matches!(result, Err(DialogError::SelectorNotSet { frame: 0, .. })));
}

#[tokio::test]
async fn test_shutdown_writes_history_without_auto_save() {
    let mut settings = two_frames();
    settings.prompt_history_settings.auto_save = false;
    let history_settings = settings.prompt_history_settings.clone();
    let Harness {
        mut session, vault, ..
    } = harness(settings).await;

    session.open_workspace().await.unwrap();
    session.send_text("kept after exit").await.unwrap();

    let options = HistoryOptions::from_settings(&history_settings, vault.path());
    let storage = crate::history::HistoryStorage::new(&options.folder, options.layout);
    assert!(storage.load().unwrap().records.is_empty());

    session.shutdown().await.unwrap();

    let reopened = HistoryStore::open(options).await.unwrap();
    let records = reopened.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "kept after exit");
}
