use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pending_with(id: u64) -> (Pending, oneshot::Receiver<Result<Value, CdpError>>) {
    let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
    let (tx, rx) = oneshot::channel();
    pending.lock().insert(id, tx);
    (pending, rx)
}

fn response(json: &str) -> CdpResponse {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn test_route_reply_to_waiting_caller() {
    let (pending, rx) = pending_with(4);
    let detached = Mutex::new(HashSet::new());

    CdpClient::route(
        response(r#"{"id": 4, "result": {"sessionId": "s1"}}"#),
        &pending,
        &detached,
    );

    let result = rx.await.unwrap().unwrap();
    assert_eq!(result["sessionId"], "s1");
    assert!(pending.lock().is_empty());
}

#[tokio::test]
async fn test_route_protocol_error() {
    let (pending, rx) = pending_with(5);
    let detached = Mutex::new(HashSet::new());

    CdpClient::route(
        response(r#"{"id": 5, "error": {"code": -32601, "message": "'Foo.bar' wasn't found"}}"#),
        &pending,
        &detached,
    );

    match rx.await.unwrap() {
        Err(CdpError::Protocol { code, .. }) => assert_eq!(code, -32601),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_route_detach_event() {
    let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
    let detached = Mutex::new(HashSet::new());

    CdpClient::route(
        response(
            r#"{"method": "Target.detachedFromTarget", "params": {"sessionId": "s2", "targetId": "t2"}}"#,
        ),
        &pending,
        &detached,
    );
    CdpClient::route(
        response(r#"{"method": "Page.frameNavigated", "params": {}, "sessionId": "s3"}"#),
        &pending,
        &detached,
    );

    let detached = detached.lock();
    assert!(detached.contains("s2"));
    assert_eq!(detached.len(), 1);
}

#[tokio::test]
async fn test_fetch_version() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Browser": "Chrome/120.0.6099.109",
            "Protocol-Version": "1.3",
            "User-Agent": "Mozilla/5.0",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        })))
        .mount(&mock_server)
        .await;

    let version = fetch_version(&format!("{}/", mock_server.uri())).await.unwrap();
    assert_eq!(version.browser, "Chrome/120.0.6099.109");
    assert_eq!(
        version.web_socket_debugger_url,
        "ws://127.0.0.1:9222/devtools/browser/abc"
    );
}

#[tokio::test]
async fn test_fetch_version_not_chrome() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = fetch_version(&mock_server.uri()).await;
    assert!(matches!(result, Err(CdpError::ChromeNotAvailable(_))));
}

#[tokio::test]
async fn test_unavailable_chrome_names_the_configured_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let message = fetch_version(&mock_server.uri()).await.unwrap_err().to_string();
    assert!(message.contains(&mock_server.uri()));
    assert!(message.contains("[browser] debug_port"));
    assert!(!message.contains("--remote-debugging-port"));
}

#[tokio::test]
async fn test_fetch_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "A1", "type": "page", "title": "ChatGPT", "url": "https://chatgpt.com/c/1"},
            {"id": "B2", "type": "service_worker", "title": "", "url": "https://kimi.com/sw.js"}
        ])))
        .mount(&mock_server)
        .await;

    let pages = fetch_pages(&mock_server.uri()).await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].id, "A1");
    assert!(pages[0].is_page());
    assert!(!pages[1].is_page());
}

#[tokio::test]
async fn test_create_target_uses_put() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/json/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "NEW1",
            "type": "page",
            "title": "",
            "url": "https://kimi.moonshot.cn/"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = create_target(&mock_server.uri(), Some("https://kimi.moonshot.cn"))
        .await
        .unwrap();
    assert_eq!(page.id, "NEW1");
}
