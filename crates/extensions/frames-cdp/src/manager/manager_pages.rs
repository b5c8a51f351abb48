//! BrowserManager tab operations.

use std::collections::HashSet;
use std::sync::Arc;

use multiai_core::platform::url_host;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::manager_core::PageState;
use super::{BrowserError, BrowserManager};
use crate::cdp::{CdpClient, PageInfo, PageSession};

/// Tabs a fresh Chrome window starts with.
const BLANK_URLS: [&str; 3] = ["about:blank", "chrome://newtab/", "chrome://new-tab-page/"];

/// An existing tab that can host a frame.
#[derive(Debug, Clone, Copy)]
pub(super) enum TabChoice<'a> {
    /// Already shows the site.
    SameSite(&'a PageInfo),
    /// Empty tab, needs navigating.
    Blank(&'a PageInfo),
}

/// Pick a tab for `url` among Chrome's targets, skipping the ones in `taken`.
/// A tab on the same host wins over a blank one.
pub(super) fn pick_tab<'a>(
    pages: &'a [PageInfo],
    url: &str,
    taken: &HashSet<String>,
) -> Option<TabChoice<'a>> {
    let free = || {
        pages
            .iter()
            .filter(|p| p.is_page() && !taken.contains(&p.id))
    };

    if let Some(host) = url_host(url) {
        let same_site = free().find(|p| {
            url_host(&p.url).is_some_and(|h| h == host || h.ends_with(&format!(".{}", host)))
        });
        if let Some(page) = same_site {
            return Some(TabChoice::SameSite(page));
        }
    }

    free()
        .find(|p| BLANK_URLS.contains(&p.url.as_str()))
        .map(TabChoice::Blank)
}

impl BrowserManager {
    /// Open a tab showing `url`, reusing an existing tab on the same site.
    /// Returns the page id.
    pub async fn open_page(&self, url: &str) -> Result<String, BrowserError> {
        self.ensure_connected().await?;
        let client = self.client().await?;

        let session = match self.reusable_tab(&client, url).await {
            Some((target_id, needs_navigation)) => {
                let session = client.attach_page(&target_id).await?;
                if needs_navigation {
                    session.navigate(url).await?;
                }
                debug!("Reusing tab {} for {}", target_id, url);
                session
            }
            None => {
                let session = client.new_page(Some(url)).await?;
                session.wait_for_load().await?;
                session
            }
        };

        let page_id = {
            let mut counter = self.page_counter.write().await;
            *counter += 1;
            format!("page_{}", *counter)
        };

        self.pages.write().await.insert(
            page_id.clone(),
            PageState {
                session: Arc::new(session),
                url: url.to_string(),
            },
        );

        info!("Opened {} for {}", page_id, url);
        Ok(page_id)
    }

    /// Target id of a tab that can be reused, and whether it must be navigated.
    async fn reusable_tab(&self, client: &CdpClient, url: &str) -> Option<(String, bool)> {
        let pages = match client.list_pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Failed to list Chrome tabs: {}", e);
                return None;
            }
        };
        let taken: HashSet<String> = self
            .pages
            .read()
            .await
            .values()
            .map(|state| state.session.target_id().to_string())
            .collect();

        match pick_tab(&pages, url, &taken)? {
            TabChoice::SameSite(page) => Some((page.id.clone(), false)),
            TabChoice::Blank(page) => Some((page.id.clone(), true)),
        }
    }

    /// Ids of the tracked pages, in opening order.
    pub async fn page_ids(&self) -> Vec<String> {
        let pages = self.pages.read().await;
        let mut ids: Vec<String> = pages.keys().cloned().collect();
        ids.sort_by_key(|id| {
            id.strip_prefix("page_")
                .and_then(|n| n.parse::<u64>().ok())
                .unwrap_or(u64::MAX)
        });
        ids
    }

    /// Whether any tracked tab is still open.
    pub async fn has_open_pages(&self) -> bool {
        self.pages
            .read()
            .await
            .values()
            .any(|state| state.session.is_attached())
    }

    /// Close a tab.
    pub async fn close_page(&self, page_id: &str) -> Result<(), BrowserError> {
        let state = self.pages.write().await.remove(page_id);
        if let Some(state) = state {
            let client = self.client().await?;
            client.close_page(state.session.target_id()).await?;
            debug!("Closed page {} ({})", page_id, state.url);
        }
        Ok(())
    }

    /// Close every tracked tab.
    pub async fn close_all_pages(&self) -> Result<(), BrowserError> {
        for page_id in self.page_ids().await {
            if let Err(e) = self.close_page(&page_id).await {
                warn!("Failed to close {}: {}", page_id, e);
            }
        }
        Ok(())
    }

    /// Get current URL.
    pub async fn get_url(&self, page_id: &str) -> Result<String, BrowserError> {
        let session = self.get_session(page_id).await?;
        Ok(session.get_url().await?)
    }

    /// Activate the tab.
    pub async fn bring_to_front(&self, page_id: &str) -> Result<(), BrowserError> {
        let session = self.get_session(page_id).await?;
        session.bring_to_front().await?;
        Ok(())
    }

    /// Press key.
    pub async fn press_key(&self, page_id: &str, key: &str) -> Result<(), BrowserError> {
        let session = self.get_session(page_id).await?;
        session.press_key(key).await?;
        Ok(())
    }

    /// Run a page function with `document` as `this`.
    pub async fn call_document_function(
        &self,
        page_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        let session: Arc<PageSession> = self.get_session(page_id).await?;
        Ok(session.call_document_function(function, args).await?)
    }
}
