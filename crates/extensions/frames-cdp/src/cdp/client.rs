//! CDP WebSocket client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{
    BrowserVersion, CdpRequest, CdpResponse, DETACHED_FROM_TARGET, DetachedFromTarget, PageInfo,
};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch `/json/version` from a Chrome debugging endpoint.
pub async fn fetch_version(endpoint: &str) -> Result<BrowserVersion, CdpError> {
    let url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    debug!("Fetching browser version from {}", url);

    reqwest::get(&url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
        .json()
        .await
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))
}

/// List the targets (tabs, workers, ...) Chrome has open.
pub async fn fetch_pages(endpoint: &str) -> Result<Vec<PageInfo>, CdpError> {
    let url = format!("{}/json/list", endpoint.trim_end_matches('/'));
    let pages: Vec<PageInfo> = reqwest::get(&url)
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(pages)
}

/// Open a new tab. Chrome requires PUT for `/json/new`.
pub(crate) async fn create_target(endpoint: &str, url: Option<&str>) -> Result<PageInfo, CdpError> {
    let endpoint = endpoint.trim_end_matches('/');
    let create_url = match url {
        Some(u) => format!("{}/json/new?{}", endpoint, u),
        None => format!("{}/json/new", endpoint),
    };

    let page_info: PageInfo = reqwest::Client::new()
        .put(&create_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    debug!("Created new page: {} - {}", page_info.id, page_info.url);
    Ok(page_info)
}

/// The browser WebSocket, shared by the client and every page session.
pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
    /// Sessions whose target went away.
    detached: Arc<Mutex<HashSet<String>>>,
    closed: Arc<AtomicBool>,
}

impl Connection {
    /// Send one command and wait for its reply.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if self.is_closed() {
            return Err(CdpError::SessionClosed);
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn is_detached(&self, session_id: &str) -> bool {
        self.detached.lock().contains(session_id)
    }
}

/// CDP client for one Chrome instance.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    /// Browser WebSocket URL.
    browser_ws_url: String,
    conn: Arc<Connection>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint (e.g. "http://localhost:9222").
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();

        let version = fetch_version(&http_endpoint).await?;
        debug!("Connected to browser: {}", version.browser);

        let browser_ws_url = version.web_socket_debugger_url;
        let (ws_stream, _) = tokio_tungstenite::connect_async(browser_ws_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let detached = Arc::new(Mutex::new(HashSet::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let recv_task = {
            let pending = pending.clone();
            let detached = detached.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending.clone(), detached).await;
                closed.store(true, Ordering::SeqCst);
                // Dropping the senders fails every waiting call with SessionClosed.
                pending.lock().clear();
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            conn: Arc::new(Connection {
                ws_tx: tokio::sync::Mutex::new(ws_sink),
                request_id: AtomicU64::new(1),
                pending,
                detached,
                closed,
            }),
            recv_task,
        })
    }

    async fn receive_loop(
        mut ws_source: WsSource,
        pending: Pending,
        detached: Arc<Mutex<HashSet<String>>>,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => Self::route(resp, &pending, &detached),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Replies go to their waiting caller, detach events mark the session gone.
    fn route(resp: CdpResponse, pending: &Pending, detached: &Mutex<HashSet<String>>) {
        if let Some(id) = resp.id {
            let waiting = pending.lock().remove(&id);
            if let Some(tx) = waiting {
                let _ = tx.send(resp.into_reply());
            }
            return;
        }

        match resp.method.as_deref() {
            Some(DETACHED_FROM_TARGET) => {
                let event = resp
                    .params
                    .and_then(|p| serde_json::from_value::<DetachedFromTarget>(p).ok());
                if let Some(event) = event {
                    debug!(
                        "Target {:?} detached (session {})",
                        event.target_id, event.session_id
                    );
                    detached.lock().insert(event.session_id);
                }
            }
            Some(method) => trace!(
                "Ignoring CDP event {} for session {:?}",
                method, resp.session_id
            ),
            None => {}
        }
    }

    /// Send a browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, None).await
    }

    /// Whether the WebSocket is still open.
    pub fn is_connected(&self) -> bool {
        !self.conn.is_closed()
    }

    pub fn endpoint(&self) -> &str {
        &self.http_endpoint
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// List all targets.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        fetch_pages(&self.http_endpoint).await
    }

    /// Open a new tab and attach to it.
    pub async fn new_page(&self, url: Option<&str>) -> Result<PageSession, CdpError> {
        let page_info = create_target(&self.http_endpoint, url).await?;
        self.attach_page(&page_info.id).await
    }

    /// Attach to an existing tab.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();
        debug!("Attached to target {} (session {})", target_id, session_id);

        Ok(PageSession::new(
            target_id.to_string(),
            session_id,
            self.conn.clone(),
        ))
    }

    /// Close a tab.
    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.call(
            "Target.closeTarget",
            Some(json!({"targetId": target_id})),
        )
        .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
        self.conn.closed.store(true, Ordering::SeqCst);
        self.conn.pending.lock().clear();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
