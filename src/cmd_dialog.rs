//! Workspace and dialog subcommand handlers.

use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use multiai_config::{Config, ConfigLoader, ConfigValidator, Settings, ValidationResult};
use multiai_core::{
    CollectedResponse, DialogSession, DispatchReport, DispatchStatus, FsDocumentStore,
    PlatformRegistry, SelectorKind, SessionOptions,
};
use multiai_frames_cdp::{BrowserManagerConfig, CdpWorkspace};

use crate::adapters::{ConsoleNotifier, NoteFileEditor, parse_line_range};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Configuration and settings of one CLI invocation.
pub(crate) struct Loaded {
    pub config: Config,
    pub settings: Settings,
}

impl Loaded {
    pub(crate) fn load(config_path: &Path, settings_path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = ConfigLoader::load_or_default(config_path)?;
        let settings_path = settings_path.unwrap_or(config.paths.settings.as_path());
        let settings = ConfigLoader::load_settings(settings_path)?;
        info!(
            "Loaded config {} and settings {}",
            config_path.display(),
            settings_path.display()
        );
        Ok(Self { config, settings })
    }
}

/// Build a dialog session on Chrome, rooted at the configured vault.
async fn create_session(loaded: &Loaded) -> Result<DialogSession, Box<dyn std::error::Error>> {
    let backend = Arc::new(CdpWorkspace::new(BrowserManagerConfig::from(
        &loaded.config.browser,
    )));
    let documents = Arc::new(FsDocumentStore::new(loaded.config.paths.vault.clone()));
    let session = DialogSession::new(
        loaded.settings.clone(),
        SessionOptions::from_config(&loaded.config),
        backend,
        documents,
        Arc::new(ConsoleNotifier),
    )
    .await?;
    Ok(session)
}

/// Session with the workspace tabs opened or re-attached.
async fn open_session(loaded: &Loaded) -> Result<DialogSession, Box<dyn std::error::Error>> {
    let mut session = create_session(loaded).await?;
    let frames = session.open_workspace().await?;
    info!("Workspace has {} frames", frames);
    Ok(session)
}

pub(crate) async fn open(loaded: &Loaded) -> CmdResult {
    let session = open_session(loaded).await?;
    for frame in session.settings().active_frames() {
        println!("  {:<12} {}", frame.display_name, frame.url);
    }
    session.shutdown().await?;
    Ok(())
}

pub(crate) async fn send(
    loaded: &Loaded,
    text: Option<String>,
    note: Option<&Path>,
    lines: Option<&str>,
    collect: bool,
) -> CmdResult {
    let mut session = open_session(loaded).await?;

    let report = match (text, note) {
        (text, Some(note)) => {
            let mut editor = NoteFileEditor::open(note)?;
            if let Some(lines) = lines {
                let (first, last) = parse_line_range(lines)?;
                editor.select_lines(first, last);
            }
            session
                .send_from_editor(&mut editor, text.as_deref())
                .await?
        }
        (Some(text), None) => session.send_text(&text).await?,
        (None, None) => {
            let text = read_stdin()?;
            session.send_text(&text).await?
        }
    };
    print_report(&report);

    let collected = if collect && report.any_success() {
        session.collect().await.map(Some)
    } else {
        Ok(None)
    };
    // The sent prompt is in the history even when collecting failed.
    session.shutdown().await?;
    if let Some(responses) = collected? {
        print_responses(&responses);
    }
    Ok(())
}

fn read_stdin() -> std::io::Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text)?;
    Ok(text)
}

fn print_report(report: &DispatchReport) {
    for frame in &report.frames {
        let status = match &frame.status {
            DispatchStatus::Sent => "sent".to_string(),
            DispatchStatus::Failed(failure) => format!("failed: {}", failure),
            DispatchStatus::Skipped => "skipped (no matching platform)".to_string(),
        };
        println!("  [{}] {:<12} {}", frame.index, frame.display_name, status);
    }
}

fn print_responses(responses: &[CollectedResponse]) {
    for response in responses {
        let marker = if response.complete { "" } else { " (still writing)" };
        println!("\n== {}{} ==\n{}", response.display_name, marker, response.text);
    }
}

pub(crate) async fn collect(loaded: &Loaded) -> CmdResult {
    let mut session = open_session(loaded).await?;
    let responses = session.collect().await?;
    print_responses(&responses);
    session.shutdown().await?;
    Ok(())
}

pub(crate) async fn test_selector(loaded: &Loaded, frame: usize, kind: SelectorKind) -> CmdResult {
    let mut session = open_session(loaded).await?;
    session.test_selector(frame, kind).await?;
    session.shutdown().await?;
    Ok(())
}

pub(crate) async fn close(loaded: &Loaded) -> CmdResult {
    let mut session = open_session(loaded).await?;
    session.close_workspace().await?;
    session.shutdown().await?;
    println!("Workspace closed");
    Ok(())
}

/// Print the platform table and the frames that would be opened.
pub(crate) fn platforms(loaded: &Loaded) -> CmdResult {
    let registry = PlatformRegistry::from_settings(&loaded.settings);

    println!("{:<10} {:<12} {:<20} {:<8} {}", "KEY", "NAME", "HOSTS", "SEND", "RESPONSE");
    println!("{}", "-".repeat(80));
    for platform in registry.entries() {
        let send = if platform.send_selector.is_empty() {
            "enter"
        } else {
            "click"
        };
        let response = if platform.response_selector.is_empty() {
            "-"
        } else {
            platform.response_selector.as_str()
        };
        println!(
            "{:<10} {:<12} {:<20} {:<8} {}",
            platform.key,
            platform.display_name,
            platform.hosts.join(","),
            send,
            response
        );
    }

    let active = loaded.settings.active_frames();
    println!("\nFrames ({} of {} active):", active.len(), loaded.settings.frames.len());
    for (index, frame) in active.iter().enumerate() {
        let platform = registry
            .resolve(&frame.url)
            .map(|p| p.key.as_str())
            .unwrap_or("unmatched");
        println!("  [{}] {:<12} {:<40} {}", index, frame.display_name, frame.url, platform);
    }
    Ok(())
}

pub(crate) fn validate(loaded: &Loaded) -> CmdResult {
    let config = ConfigValidator::validate(&loaded.config)?;
    let settings = ConfigValidator::validate_settings(&loaded.settings)?;

    let ok = print_validation("config", &config) & print_validation("settings", &settings);
    if !ok {
        return Err("validation failed".into());
    }
    println!("Configuration is valid");
    Ok(())
}

fn print_validation(label: &str, result: &ValidationResult) -> bool {
    for error in &result.errors {
        println!("error   {}.{}: {}", label, error.path, error.message);
    }
    for warning in &result.warnings {
        warn!("{}.{}: {}", label, warning.path, warning.message);
        println!("warning {}.{}: {}", label, warning.path, warning.message);
    }
    result.is_valid()
}
