//! Fan-in: scrape the latest reply from every frame.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use multiai_config::CollectorConfig;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::command::{CommandOutcome, FrameCommand};
use crate::error::{DialogError, FrameError};
use crate::platform::{PlatformConfig, PlatformRegistry};
use crate::workspace::{FrameSlot, Workspace};

/// When a reply counts as collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectPolicy {
    /// Wait once, then read.
    Fixed { delay: Duration },
    /// Read every `interval` until the text stops changing for `stable_for`.
    Poll {
        interval: Duration,
        stable_for: Duration,
        max_wait: Duration,
    },
}

impl Default for CollectPolicy {
    fn default() -> Self {
        Self::from(&CollectorConfig::default())
    }
}

impl From<&CollectorConfig> for CollectPolicy {
    fn from(config: &CollectorConfig) -> Self {
        match config.mode.as_str() {
            "fixed" => CollectPolicy::Fixed {
                delay: Duration::from_millis(config.fixed_delay_ms),
            },
            other => {
                if other != "poll" {
                    warn!("Unknown collector mode '{}', using poll", other);
                }
                CollectPolicy::Poll {
                    interval: Duration::from_millis(config.interval_ms.max(1)),
                    stable_for: Duration::from_millis(config.stable_for_ms),
                    max_wait: Duration::from_millis(config.max_wait_ms),
                }
            }
        }
    }
}

/// Reply texts seen before a dispatch, keyed by frame index.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    texts: HashMap<usize, String>,
}

impl Baseline {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.texts.get(&index).map(String::as_str)
    }

    pub fn insert(&mut self, index: usize, text: impl Into<String>) {
        self.texts.insert(index, text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Reply scraped from one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedResponse {
    pub index: usize,
    pub display_name: String,
    pub platform: String,
    pub text: String,
    /// False when the poll gave up before the text settled.
    pub complete: bool,
}

pub struct Collector {
    registry: Arc<PlatformRegistry>,
    policy: CollectPolicy,
}

impl Collector {
    pub fn new(registry: Arc<PlatformRegistry>, policy: CollectPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> &CollectPolicy {
        &self.policy
    }

    /// Current last reply of every frame, taken before a dispatch.
    pub async fn snapshot(&self, workspace: &Workspace) -> Baseline {
        let reads = workspace.slots().iter().map(|slot| async move {
            let platform = self.platform_for(slot).await?;
            match read_last(slot, &platform).await {
                Ok(Some(text)) => Some((slot.spec.index, text)),
                Ok(None) => None,
                Err(e) => {
                    debug!("No baseline for frame {}: {}", slot.spec.index, e);
                    None
                }
            }
        });

        let mut baseline = Baseline::default();
        for (index, text) in join_all(reads).await.into_iter().flatten() {
            baseline.insert(index, text);
        }
        baseline
    }

    /// Collect the new reply of every frame with a response selector.
    pub async fn collect(
        &self,
        workspace: &Workspace,
        baseline: &Baseline,
    ) -> Result<Vec<CollectedResponse>, DialogError> {
        workspace.ensure_live().await?;

        let futures = workspace
            .slots()
            .iter()
            .map(|slot| self.collect_slot(slot, baseline.get(slot.spec.index)));
        let responses = join_all(futures).await.into_iter().flatten().collect();
        Ok(responses)
    }

    async fn platform_for(&self, slot: &FrameSlot) -> Option<PlatformConfig> {
        let url = match slot.context.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("Frame {} has no readable URL: {}", slot.spec.index, e);
                return None;
            }
        };
        let platform = self.registry.resolve(&url)?;
        if platform.response_selector.trim().is_empty() {
            debug!("Frame {} ({}) has no response selector", slot.spec.index, platform.key);
            return None;
        }
        Some(platform.clone())
    }

    async fn collect_slot(
        &self,
        slot: &FrameSlot,
        baseline: Option<&str>,
    ) -> Option<CollectedResponse> {
        let platform = self.platform_for(slot).await?;

        let (text, complete) = match &self.policy {
            CollectPolicy::Fixed { delay } => {
                tokio::time::sleep(*delay).await;
                match read_last(slot, &platform).await {
                    Ok(Some(text)) if is_new(&text, baseline) => (text, true),
                    Ok(_) => return None,
                    Err(e) => {
                        warn!("Failed to read reply from frame {}: {}", slot.spec.index, e);
                        return None;
                    }
                }
            }
            CollectPolicy::Poll {
                interval,
                stable_for,
                max_wait,
            } => poll_until_stable(slot, &platform, baseline, *interval, *stable_for, *max_wait)
                .await?,
        };

        debug!(
            "Collected {} chars from frame {} ({}), complete: {}",
            text.chars().count(),
            slot.spec.index,
            platform.key,
            complete
        );
        Some(CollectedResponse {
            index: slot.spec.index,
            display_name: slot.spec.display_name.clone(),
            platform: platform.key,
            text,
            complete,
        })
    }
}

async fn read_last(slot: &FrameSlot, platform: &PlatformConfig) -> Result<Option<String>, FrameError> {
    let command = FrameCommand::ReadLast {
        selector: platform.response_selector.clone(),
        visible_only: platform.response_visible_only,
    };
    match slot.context.execute(&command).await? {
        CommandOutcome::Text(text) => Ok(text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())),
        CommandOutcome::NotFound => Ok(None),
        other => Err(FrameError::Script(format!(
            "unexpected read outcome: {:?}",
            other
        ))),
    }
}

fn is_new(text: &str, baseline: Option<&str>) -> bool {
    baseline != Some(text)
}

async fn poll_until_stable(
    slot: &FrameSlot,
    platform: &PlatformConfig,
    baseline: Option<&str>,
    interval: Duration,
    stable_for: Duration,
    max_wait: Duration,
) -> Option<(String, bool)> {
    let started = Instant::now();
    let mut last: Option<String> = None;
    let mut changed_at = started;

    loop {
        match read_last(slot, platform).await {
            Ok(Some(text)) if is_new(&text, baseline) => {
                if last.as_deref() == Some(text.as_str()) {
                    if changed_at.elapsed() >= stable_for {
                        return Some((text, true));
                    }
                } else {
                    last = Some(text);
                    changed_at = Instant::now();
                }
            }
            Ok(_) => {}
            Err(FrameError::NotLive) => {
                warn!("Frame {} closed while collecting", slot.spec.index);
                return last.map(|t| (t, false));
            }
            Err(e) => debug!("Read from frame {} failed: {}", slot.spec.index, e),
        }

        if started.elapsed() >= max_wait {
            if last.is_some() {
                warn!("Reply in frame {} did not settle in {:?}", slot.spec.index, max_wait);
            }
            return last.map(|t| (t, false));
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
