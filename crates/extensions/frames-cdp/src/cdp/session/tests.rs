use serde_json::json;

use super::input::{KeyDefinition, key_definition};
use super::js::{call_arguments, script_exception};
use crate::cdp::error::CdpError;

#[test]
fn test_call_arguments_wrap_values() {
    let args = call_arguments(vec![json!("#prompt-textarea"), json!("paste"), json!("hi \"there\"")]);
    assert_eq!(
        args,
        json!([
            {"value": "#prompt-textarea"},
            {"value": "paste"},
            {"value": "hi \"there\""}
        ])
    );
}

#[test]
fn test_call_arguments_keep_types() {
    let args = call_arguments(vec![json!(true), json!(2000)]);
    assert_eq!(args, json!([{"value": true}, {"value": 2000}]));
}

#[test]
fn test_script_exception_absent() {
    let result = json!({"result": {"type": "string", "value": "done"}});
    assert!(script_exception(&result).is_none());
}

#[test]
fn test_script_exception_description() {
    let result = json!({
        "result": {"type": "object"},
        "exceptionDetails": {
            "exceptionId": 2,
            "text": "Uncaught",
            "lineNumber": 0,
            "columnNumber": 0,
            "exception": {
                "type": "object",
                "description": "SyntaxError: '##x' is not a valid selector"
            }
        }
    });
    match script_exception(&result) {
        Some(CdpError::JavaScript(msg)) => assert!(msg.contains("not a valid selector")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_script_exception_partial_details() {
    let result = json!({"exceptionDetails": {"text": "Uncaught ReferenceError"}});
    match script_exception(&result) {
        Some(CdpError::JavaScript(msg)) => assert_eq!(msg, "Uncaught ReferenceError"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_enter_types_carriage_return() {
    assert_eq!(
        key_definition("Enter"),
        Some(KeyDefinition {
            code: "Enter",
            key_code: 13,
            text: Some("\r"),
        })
    );
}

#[test]
fn test_unknown_key() {
    assert_eq!(key_definition("F13"), None);
    assert_eq!(key_definition("Tab").map(|d| d.text), Some(None));
}
