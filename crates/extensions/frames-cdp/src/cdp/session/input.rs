//! Keyboard input for CDP page session.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::KeyEventType;

use super::core::PageSession;

/// What Chrome needs to know about a key for the page to see a real press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct KeyDefinition {
    pub code: &'static str,
    pub key_code: u32,
    /// Character the key types, if any.
    pub text: Option<&'static str>,
}

pub(super) fn key_definition(key: &str) -> Option<KeyDefinition> {
    let (code, key_code, text) = match key {
        "Enter" => ("Enter", 13, Some("\r")),
        "Tab" => ("Tab", 9, None),
        "Escape" => ("Escape", 27, None),
        "Backspace" => ("Backspace", 8, None),
        _ => return None,
    };
    Some(KeyDefinition {
        code,
        key_code,
        text,
    })
}

impl PageSession {
    /// Press and release a named key in the focused element.
    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        let definition = key_definition(key);

        let mut down = json!({
            "type": KeyEventType::KeyDown,
            "key": key,
        });
        let mut up = json!({
            "type": KeyEventType::KeyUp,
            "key": key,
        });
        if let Some(def) = &definition {
            for event in [&mut down, &mut up] {
                event["code"] = json!(def.code);
                event["windowsVirtualKeyCode"] = json!(def.key_code);
            }
            if let Some(text) = def.text {
                down["text"] = json!(text);
            }
        }

        self.call("Input.dispatchKeyEvent", Some(down)).await?;
        self.call("Input.dispatchKeyEvent", Some(up)).await?;

        debug!("Pressed {} in target {}", key, self.target_id);
        Ok(())
    }
}
