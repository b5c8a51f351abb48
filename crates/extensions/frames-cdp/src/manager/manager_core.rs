//! BrowserManager core: struct definition, connect, Chrome process management.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::cdp::{CdpClient, PageSession, fetch_version};

const LAUNCH_ATTEMPTS: u32 = 30;
const LAUNCH_POLL: Duration = Duration::from_millis(200);
const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Page state tracking.
pub(super) struct PageState {
    pub(super) session: Arc<PageSession>,
    pub(super) url: String,
}

/// Manages the Chrome connection and the tabs hosting the frames.
pub struct BrowserManager {
    pub(super) config: BrowserManagerConfig,
    pub(super) client: RwLock<Option<Arc<CdpClient>>>,
    pub(super) pages: RwLock<HashMap<String, PageState>>,
    pub(super) page_counter: RwLock<u64>,
    /// Chrome process handle (if we launched it).
    pub(super) chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    /// Create a new browser manager. Nothing is launched or connected yet.
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            pages: RwLock::new(HashMap::new()),
            page_counter: RwLock::new(0),
            chrome_process: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BrowserManagerConfig {
        &self.config
    }

    /// Find Chrome executable path.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// Check if Chrome is already answering on the debug port.
    pub(super) async fn is_chrome_running(&self) -> bool {
        fetch_version(&self.config.endpoint()).await.is_ok()
    }

    /// Launch Chrome with remote debugging enabled.
    pub(super) async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = Self::find_chrome().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.config.get_profile_dir();

        if let Err(e) = tokio::fs::create_dir_all(&profile_dir).await {
            warn!("Failed to create profile directory: {}", e);
        }

        info!(
            "Launching Chrome with profile at: {}",
            profile_dir.display()
        );

        let mut cmd = Command::new(&chrome_path);
        cmd.arg(format!("--remote-debugging-port={}", self.config.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect to the browser, launching it if necessary.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.is_alive().await {
            return Ok(());
        }

        if !self.is_chrome_running().await {
            info!("Chrome not running on port {}, launching...", self.config.debug_port);

            let child = self.launch_chrome().await?;
            *self.chrome_process.write().await = Some(child);

            let mut started = false;
            for _ in 0..LAUNCH_ATTEMPTS {
                tokio::time::sleep(LAUNCH_POLL).await;
                if self.is_chrome_running().await {
                    started = true;
                    break;
                }
            }

            if !started {
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        } else {
            info!("Chrome already running on port {}", self.config.debug_port);
        }

        let client = CdpClient::connect(&self.config.endpoint()).await?;
        *self.client.write().await = Some(Arc::new(client));
        // Sessions of a previous connection are dead.
        self.pages.write().await.clear();

        info!("Connected to Chrome at {}", self.config.endpoint());
        Ok(())
    }

    /// Ensure the browser is connected before use.
    pub async fn ensure_connected(&self) -> Result<(), BrowserError> {
        self.connect().await
    }

    /// Get the CDP client.
    pub(super) async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Get page session by ID.
    pub(super) async fn get_session(&self, page_id: &str) -> Result<Arc<PageSession>, BrowserError> {
        let pages = self.pages.read().await;
        let state = pages
            .get(page_id)
            .ok_or_else(|| BrowserError::PageNotFound(page_id.to_string()))?;
        if !state.session.is_attached() {
            return Err(BrowserError::PageNotFound(page_id.to_string()));
        }
        Ok(state.session.clone())
    }

    /// Whether the browser answers a `Browser.getVersion` ping.
    pub async fn is_alive(&self) -> bool {
        let Ok(client) = self.client().await else {
            return false;
        };
        if !client.is_connected() {
            return false;
        }
        match tokio::time::timeout(PING_TIMEOUT, client.call("Browser.getVersion", None)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Browser ping failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Browser ping timed out");
                false
            }
        }
    }

    /// Drop the connection. Chrome itself keeps running.
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.pages.write().await.clear();
        let _ = self.client.write().await.take();

        info!("Browser connection closed");
        Ok(())
    }

    /// Shutdown Chrome if we launched it.
    pub async fn shutdown_chrome(&self) -> Result<(), BrowserError> {
        self.close().await?;

        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("Shutting down Chrome...");
            let _ = child.kill().await;
        }

        Ok(())
    }
}
