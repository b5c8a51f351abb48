use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Runtime.callFunctionOn".to_string(),
        params: Some(serde_json::json!({"objectId": "obj-1"})),
        session_id: Some("sess-1".to_string()),
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["method"], "Runtime.callFunctionOn");
    assert_eq!(json["sessionId"], "sess-1");
}

#[test]
fn test_cdp_request_omits_empty_fields() {
    let req = CdpRequest {
        id: 7,
        method: "Browser.getVersion".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert_eq!(json, r#"{"id":7,"method":"Browser.getVersion"}"#);
}

#[test]
fn test_cdp_response_deserialize() {
    let json = r#"{"id": 1, "result": {"frameId": "abc"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.result.is_some());
    assert!(resp.error.is_none());
}

#[test]
fn test_cdp_error_response_deserialize() {
    let json = r#"{"id": 3, "error": {"code": -32000, "message": "No target with given id"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    let error = resp.error.unwrap();
    assert_eq!(error.code, -32000);
    assert_eq!(error.message, "No target with given id");
}

#[test]
fn test_detached_event_deserialize() {
    let json = r#"{
        "method": "Target.detachedFromTarget",
        "params": {"sessionId": "sess-9", "targetId": "tab-9"}
    }"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert!(resp.id.is_none());
    assert_eq!(resp.method.as_deref(), Some(DETACHED_FROM_TARGET));
    let detached: DetachedFromTarget = serde_json::from_value(resp.params.unwrap()).unwrap();
    assert_eq!(detached.session_id, "sess-9");
    assert_eq!(detached.target_id.as_deref(), Some("tab-9"));
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "ChatGPT",
        "url": "https://chatgpt.com/",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.id, "page123");
    assert!(info.is_page());
}

#[test]
fn test_service_worker_is_not_a_page() {
    let json = r#"{"id": "w1", "type": "service_worker", "title": "", "url": "https://kimi.com/sw.js"}"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();
    assert!(!info.is_page());
}

#[test]
fn test_browser_version_deserialize() {
    let json = r#"{
        "Browser": "Chrome/120.0.6099.109",
        "Protocol-Version": "1.3",
        "User-Agent": "Mozilla/5.0",
        "V8-Version": "12.0.267.8",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/abc"
    }"#;
    let version: BrowserVersion = serde_json::from_str(json).unwrap();
    assert_eq!(version.protocol_version, "1.3");
    assert!(version.web_socket_debugger_url.ends_with("/browser/abc"));
}

#[test]
fn test_exception_message_prefers_description() {
    let json = r#"{
        "exceptionId": 1,
        "text": "Uncaught",
        "lineNumber": 0,
        "columnNumber": 10,
        "exception": {"type": "object", "subtype": "error", "description": "SyntaxError: bad selector"}
    }"#;
    let details: ExceptionDetails = serde_json::from_str(json).unwrap();
    assert_eq!(details.message(), "SyntaxError: bad selector");
}

#[test]
fn test_key_event_type_serialize() {
    assert_eq!(serde_json::to_string(&KeyEventType::KeyDown).unwrap(), "\"keyDown\"");
    assert_eq!(serde_json::to_string(&KeyEventType::RawKeyDown).unwrap(), "\"rawKeyDown\"");
}

#[test]
fn test_error_reply_becomes_protocol_error() {
    let json = r#"{"id": 4, "error": {"code": -32601, "message": "'Foo.bar' wasn't found"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    match resp.into_reply() {
        Err(CdpError::Protocol { code, message }) => {
            assert_eq!(code, -32601);
            assert_eq!(message, "'Foo.bar' wasn't found");
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn test_empty_reply_is_null() {
    let resp: CdpResponse = serde_json::from_str(r#"{"id": 5, "result": {}}"#).unwrap();
    assert_eq!(resp.into_reply().unwrap(), serde_json::json!({}));

    let resp: CdpResponse = serde_json::from_str(r#"{"id": 6}"#).unwrap();
    assert!(resp.into_reply().unwrap().is_null());
}
