//! Platform registry: which selectors and recipe apply to a frame.

use multiai_config::{FrameConfig, SendType, Settings};
use tracing::debug;
use url::Url;

use crate::command::InsertStrategy;

mod builtin;

use builtin::{BUILTIN_PLATFORMS, BuiltinPlatform};

/// Selectors and injection recipe for one AI site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub key: String,
    pub display_name: String,
    pub url: String,
    /// Hosts this platform answers on. Subdomains match too.
    pub hosts: Vec<String>,
    pub input_selector: String,
    pub insert: InsertStrategy,
    /// Empty means "press Enter in the input".
    pub send_selector: String,
    pub send_kind: SendType,
    /// Empty means replies are not collected.
    pub response_selector: String,
    pub response_visible_only: bool,
}

impl From<&BuiltinPlatform> for PlatformConfig {
    fn from(b: &BuiltinPlatform) -> Self {
        Self {
            key: b.key.to_string(),
            display_name: b.display_name.to_string(),
            url: b.url.to_string(),
            hosts: b.hosts.iter().map(|h| h.to_string()).collect(),
            input_selector: b.input_selector.to_string(),
            insert: b.insert,
            send_selector: b.send_selector.to_string(),
            send_kind: b.send_kind,
            response_selector: b.response_selector.to_string(),
            response_visible_only: b.response_visible_only,
        }
    }
}

impl PlatformConfig {
    /// True when `host` equals one of the platform hosts or is a subdomain of one.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.hosts.iter().any(|h| host_matches(&host, h))
    }

    /// Host match against a full URL. Unparseable URLs never match.
    pub fn matches_url(&self, url: &str) -> bool {
        url_host(url).is_some_and(|host| self.matches_host(&host))
    }

    /// Configured frame with no built-in counterpart.
    fn custom(frame: &FrameConfig, host: String) -> Self {
        let selectors = &frame.selectors;
        Self {
            key: host.clone(),
            display_name: frame.display_name.clone(),
            url: frame.url.clone(),
            hosts: vec![host],
            input_selector: selectors.input.clone(),
            insert: InsertStrategy::from(selectors.input_type),
            send_selector: selectors.send.clone(),
            send_kind: selectors.send_type,
            response_selector: selectors.ai_response.clone(),
            response_visible_only: false,
        }
    }

    /// Built-in entry with the frame's non-empty selectors layered on top.
    fn overridden_by(mut self, frame: &FrameConfig, host: String) -> Self {
        let selectors = &frame.selectors;
        if !frame.display_name.trim().is_empty() {
            self.display_name = frame.display_name.clone();
        }
        self.url = frame.url.clone();
        if !self.hosts.iter().any(|h| host_matches(&host, h)) {
            self.hosts.push(host);
        }
        if !selectors.input.trim().is_empty() && selectors.input != self.input_selector {
            self.input_selector = selectors.input.clone();
            self.insert = InsertStrategy::from(selectors.input_type);
        }
        if !selectors.send.trim().is_empty() {
            self.send_selector = selectors.send.clone();
            self.send_kind = selectors.send_type;
        } else if selectors.send_type == SendType::Enter {
            self.send_kind = SendType::Enter;
        }
        if !selectors.ai_response.trim().is_empty() {
            self.response_selector = selectors.ai_response.clone();
        }
        self
    }
}

fn host_matches(host: &str, registered: &str) -> bool {
    host == registered
        || host
            .strip_suffix(registered)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Lowercased host of `url`, if it parses and has one.
pub fn url_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase()))
}

/// Ordered platform table. Resolution is first match in order.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    entries: Vec<PlatformConfig>,
}

impl PlatformRegistry {
    pub fn new(entries: Vec<PlatformConfig>) -> Self {
        Self { entries }
    }

    /// Built-in platforms only.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_PLATFORMS.iter().map(PlatformConfig::from).collect())
    }

    /// Configured frames first (merged with built-ins), then the remaining built-ins.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builtins: Vec<Option<PlatformConfig>> =
            BUILTIN_PLATFORMS.iter().map(|b| Some(PlatformConfig::from(b))).collect();
        let mut entries = Vec::new();

        for frame in &settings.frames {
            let Some(host) = url_host(&frame.url) else {
                debug!("Frame '{}' has no usable host, not registered", frame.display_name);
                continue;
            };
            if entries.iter().any(|e: &PlatformConfig| e.matches_host(&host)) {
                continue;
            }

            let builtin = builtins
                .iter_mut()
                .find(|b| b.as_ref().is_some_and(|b| b.matches_host(&host)))
                .and_then(Option::take);
            let entry = match builtin {
                Some(platform) => platform.overridden_by(frame, host),
                None => PlatformConfig::custom(frame, host),
            };
            entries.push(entry);
        }

        entries.extend(builtins.into_iter().flatten());
        Self::new(entries)
    }

    /// First platform whose hosts match the frame URL.
    pub fn resolve(&self, url: &str) -> Option<&PlatformConfig> {
        let host = url_host(url)?;
        self.entries.iter().find(|p| p.matches_host(&host))
    }

    pub fn get(&self, key: &str) -> Option<&PlatformConfig> {
        self.entries.iter().find(|p| p.key == key)
    }

    pub fn entries(&self) -> &[PlatformConfig] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
