//! Built-in platform table.

use multiai_config::SendType;

use crate::command::InsertStrategy;

/// Static description of a supported site.
pub(crate) struct BuiltinPlatform {
    pub key: &'static str,
    pub display_name: &'static str,
    pub url: &'static str,
    pub hosts: &'static [&'static str],
    pub input_selector: &'static str,
    pub insert: InsertStrategy,
    pub send_selector: &'static str,
    pub send_kind: SendType,
    pub response_selector: &'static str,
    pub response_visible_only: bool,
}

pub(crate) const BUILTIN_PLATFORMS: &[BuiltinPlatform] = &[
    BuiltinPlatform {
        key: "chatgpt",
        display_name: "ChatGPT",
        url: "https://chatgpt.com",
        hosts: &["chatgpt.com", "chat.openai.com"],
        input_selector: "#prompt-textarea",
        insert: InsertStrategy::EditingCommand,
        send_selector: "button[data-testid=\"send-button\"]",
        send_kind: SendType::Click,
        response_selector: ".markdown.prose",
        response_visible_only: false,
    },
    BuiltinPlatform {
        key: "kimi",
        display_name: "Kimi",
        url: "https://kimi.moonshot.cn",
        hosts: &["kimi.moonshot.cn", "kimi.com"],
        input_selector: "[data-testid=\"msh-chatinput-editor\"]",
        insert: InsertStrategy::Paste,
        send_selector: "[data-testid=\"msh-chatinput-send-button\"]",
        send_kind: SendType::Click,
        response_selector: ".markdown___vuBDJ",
        response_visible_only: false,
    },
    BuiltinPlatform {
        key: "doubao",
        display_name: "Doubao",
        url: "https://www.doubao.com",
        hosts: &["doubao.com"],
        input_selector: "textarea.semi-input-textarea",
        insert: InsertStrategy::NativeValue,
        send_selector: "#flow-end-msg-send",
        send_kind: SendType::Click,
        response_selector: "[data-testid=\"receive_message\"]",
        response_visible_only: false,
    },
    BuiltinPlatform {
        key: "yuanbao",
        display_name: "Yuanbao",
        url: "https://yuanbao.tencent.com",
        hosts: &["yuanbao.tencent.com"],
        input_selector: ".ql-editor[contenteditable=\"true\"]",
        insert: InsertStrategy::TextNode,
        send_selector: "a[class^=\"style__send-btn\"]",
        send_kind: SendType::Click,
        response_selector: ".agent-chat__conv--ai__speech_show",
        response_visible_only: true,
    },
];
