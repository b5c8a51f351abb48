use super::*;
use multiai_config::{FrameSelectors, InputType};

#[test]
fn test_builtin_entries_are_complete() {
    let registry = PlatformRegistry::builtin();
    assert_eq!(registry.len(), 4);
    for platform in registry.entries() {
        assert!(!platform.url.is_empty(), "{} has no url", platform.key);
        assert!(!platform.input_selector.is_empty(), "{} has no input", platform.key);
        assert!(!platform.send_selector.is_empty(), "{} has no send", platform.key);
        assert!(!platform.hosts.is_empty(), "{} has no hosts", platform.key);
    }
}

#[test]
fn test_resolve_by_host() {
    let registry = PlatformRegistry::builtin();
    assert_eq!(registry.resolve("https://chatgpt.com/c/abc").unwrap().key, "chatgpt");
    assert_eq!(registry.resolve("https://chat.openai.com/").unwrap().key, "chatgpt");
    assert_eq!(registry.resolve("https://www.doubao.com/chat/1").unwrap().key, "doubao");
    assert_eq!(registry.resolve("https://KIMI.moonshot.cn/chat").unwrap().key, "kimi");
}

#[test]
fn test_resolve_rejects_lookalike_hosts() {
    let registry = PlatformRegistry::builtin();
    assert!(registry.resolve("https://evilchatgpt.com/").is_none());
    assert!(registry.resolve("https://example.com/?next=chatgpt.com").is_none());
    assert!(registry.resolve("not a url").is_none());
    assert!(registry.resolve("about:blank").is_none());
}

#[test]
fn test_resolve_first_match_wins() {
    let first = PlatformConfig {
        key: "first".to_string(),
        display_name: "First".to_string(),
        url: "https://example.com".to_string(),
        hosts: vec!["example.com".to_string()],
        input_selector: "#a".to_string(),
        insert: InsertStrategy::EditingCommand,
        send_selector: "#send".to_string(),
        send_kind: SendType::Click,
        response_selector: String::new(),
        response_visible_only: false,
    };
    let mut second = first.clone();
    second.key = "second".to_string();
    second.hosts = vec!["app.example.com".to_string()];

    let registry = PlatformRegistry::new(vec![first, second.clone()]);
    assert_eq!(registry.resolve("https://app.example.com/").unwrap().key, "first");

    let reversed = PlatformRegistry::new(vec![second, registry.entries()[0].clone()]);
    assert_eq!(reversed.resolve("https://app.example.com/").unwrap().key, "second");
    assert_eq!(reversed.resolve("https://example.com/").unwrap().key, "first");
}

#[test]
fn test_from_default_settings_keeps_builtin_recipes() {
    let registry = PlatformRegistry::from_settings(&Settings::default());
    assert_eq!(registry.len(), 4);

    let kimi = registry.resolve("https://kimi.moonshot.cn/").unwrap();
    assert_eq!(kimi.insert, InsertStrategy::Paste);

    let yuanbao = registry.resolve("https://yuanbao.tencent.com/chat").unwrap();
    assert_eq!(yuanbao.insert, InsertStrategy::TextNode);
    assert_eq!(yuanbao.send_selector, "a[class^=\"style__send-btn\"]");
    assert!(yuanbao.response_visible_only);
}

#[test]
fn test_from_settings_overrides_selectors() {
    let mut settings = Settings::default();
    settings.frames = vec![
        FrameConfig::new("https://chatgpt.com/", "GPT").with_selectors(FrameSelectors {
            send: "#custom-send".to_string(),
            ..Default::default()
        }),
    ];

    let registry = PlatformRegistry::from_settings(&settings);
    let chatgpt = registry.get("chatgpt").unwrap();
    assert_eq!(chatgpt.display_name, "GPT");
    assert_eq!(chatgpt.send_selector, "#custom-send");
    assert_eq!(chatgpt.input_selector, "#prompt-textarea");
    assert_eq!(chatgpt.response_selector, ".markdown.prose");
    // Remaining built-ins are still resolvable.
    assert!(registry.get("doubao").is_some());
}

#[test]
fn test_from_settings_custom_frame() {
    let mut settings = Settings::default();
    settings.frames.insert(
        0,
        FrameConfig::new("https://chat.example.org/app", "Example").with_selectors(
            FrameSelectors {
                input: "textarea#q".to_string(),
                input_type: InputType::Textarea,
                send: String::new(),
                send_type: SendType::Enter,
                user_message: String::new(),
                ai_response: ".answer".to_string(),
            },
        ),
    );

    let registry = PlatformRegistry::from_settings(&settings);
    assert_eq!(registry.entries()[0].key, "chat.example.org");
    let custom = registry.resolve("https://chat.example.org/thread/9").unwrap();
    assert_eq!(custom.insert, InsertStrategy::NativeValue);
    assert_eq!(custom.send_kind, SendType::Enter);
    assert_eq!(custom.response_selector, ".answer");
}

#[test]
fn test_from_settings_skips_unparseable_frames() {
    let mut settings = Settings::default();
    settings.frames = vec![FrameConfig::new("", "Broken")];
    let registry = PlatformRegistry::from_settings(&settings);
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_url_host() {
    assert_eq!(url_host("https://Chat.Example.com:8443/x").as_deref(), Some("chat.example.com"));
    assert_eq!(url_host("garbage"), None);
}
