//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod schema_settings;

pub use schema_settings::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// Browser (Chrome DevTools) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Profile directory, keeps the AI sites logged in between runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,

    #[serde(default)]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            profile_dir: None,
            headless: false,
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

/// Fan-out timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Pause between inserting the text and pressing send.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Upper bound for one frame's inject + send. 0 disables the bound.
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,

    /// Replace quotes, backslashes, line breaks and dollars with full-width look-alikes.
    #[serde(default)]
    pub fullwidth_sanitize: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            frame_timeout_ms: default_frame_timeout_ms(),
            fullwidth_sanitize: false,
        }
    }
}

impl DispatchConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        (self.frame_timeout_ms > 0).then(|| Duration::from_millis(self.frame_timeout_ms))
    }
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_frame_timeout_ms() -> u64 {
    30_000
}

/// Fan-in policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// "poll" or "fixed".
    #[serde(default = "default_collector_mode")]
    pub mode: String,

    /// Wait used by the "fixed" mode.
    #[serde(default = "default_fixed_delay_ms")]
    pub fixed_delay_ms: u64,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// How long a reply must stay unchanged to count as finished.
    #[serde(default = "default_stable_for_ms")]
    pub stable_for_ms: u64,

    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            mode: default_collector_mode(),
            fixed_delay_ms: default_fixed_delay_ms(),
            interval_ms: default_interval_ms(),
            stable_for_ms: default_stable_for_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

pub const COLLECTOR_MODES: [&str; 2] = ["poll", "fixed"];

fn default_collector_mode() -> String {
    "poll".to_string()
}

fn default_fixed_delay_ms() -> u64 {
    15_000
}

fn default_interval_ms() -> u64 {
    1_000
}

fn default_stable_for_ms() -> u64 {
    3_000
}

fn default_max_wait_ms() -> u64 {
    120_000
}

/// Search-before-send limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_search_timeout_ms(),
            max_snippets: default_max_snippets(),
        }
    }
}

fn default_search_timeout_ms() -> u64 {
    3_000
}

fn default_max_snippets() -> usize {
    3
}

/// File locations. Relative history/record folders from [`Settings`] resolve under `vault`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_vault")]
    pub vault: PathBuf,

    #[serde(default = "default_settings_path")]
    pub settings: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vault: default_vault(),
            settings: default_settings_path(),
        }
    }
}

/// `~/.multiai`, or `./.multiai` without a home directory.
pub fn multiai_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".multiai")
}

fn default_vault() -> PathBuf {
    multiai_dir().join("vault")
}

fn default_settings_path() -> PathBuf {
    multiai_dir().join("settings.json")
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
