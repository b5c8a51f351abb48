use super::*;
use multiai_core::InsertStrategy;

fn inject() -> FrameCommand {
    FrameCommand::Inject {
        selector: "#prompt-textarea".to_string(),
        insert: InsertStrategy::Paste,
        text: "say \"hi\"; `rm -rf` ${x}".to_string(),
    }
}

#[test]
fn test_inject_passes_text_as_argument() {
    let call = command_call(&inject());
    assert_eq!(call.function, scripts::INJECT);
    assert_eq!(
        call.args,
        vec![
            json!("#prompt-textarea"),
            json!("paste"),
            json!("say \"hi\"; `rm -rf` ${x}")
        ]
    );
    assert!(!call.press_enter);
    assert!(!call.function.contains("rm -rf"));
}

#[test]
fn test_send_click_and_enter() {
    let click = command_call(&FrameCommand::Send {
        selector: "#send".to_string(),
        send: SendType::Click,
    });
    assert_eq!(click.function, scripts::SEND_CLICK);
    assert!(!click.press_enter);

    let enter = command_call(&FrameCommand::Send {
        selector: "#input".to_string(),
        send: SendType::Enter,
    });
    assert_eq!(enter.function, scripts::FOCUS);
    assert_eq!(enter.args, vec![json!("#input")]);
    assert!(enter.press_enter);
}

#[test]
fn test_read_and_highlight_arguments() {
    let read = command_call(&FrameCommand::ReadLast {
        selector: ".speech".to_string(),
        visible_only: true,
    });
    assert_eq!(read.function, scripts::READ_LAST);
    assert_eq!(read.args, vec![json!(".speech"), json!(true)]);

    let highlight = command_call(&FrameCommand::Highlight {
        selector: "button".to_string(),
        duration_ms: 2000,
    });
    assert_eq!(highlight.function, scripts::HIGHLIGHT);
    assert_eq!(highlight.args, vec![json!("button"), json!(2000)]);
}

#[test]
fn test_interpret_inject_and_send() {
    let cmd = inject();
    assert_eq!(interpret_outcome(&cmd, &json!("done")).unwrap(), CommandOutcome::Done);
    assert_eq!(
        interpret_outcome(&cmd, &json!("not_found")).unwrap(),
        CommandOutcome::NotFound
    );
    assert!(matches!(
        interpret_outcome(&cmd, &json!(3)),
        Err(FrameError::Script(_))
    ));
}

#[test]
fn test_interpret_read_last() {
    let cmd = FrameCommand::ReadLast {
        selector: ".markdown".to_string(),
        visible_only: false,
    };
    assert_eq!(
        interpret_outcome(&cmd, &Value::Null).unwrap(),
        CommandOutcome::Text(None)
    );
    assert_eq!(
        interpret_outcome(&cmd, &json!("Hello")).unwrap(),
        CommandOutcome::Text(Some("Hello".to_string()))
    );
    assert!(interpret_outcome(&cmd, &json!({"text": "x"})).is_err());
}

#[test]
fn test_interpret_highlight() {
    let cmd = FrameCommand::Highlight {
        selector: "p".to_string(),
        duration_ms: 2000,
    };
    assert_eq!(
        interpret_outcome(&cmd, &json!(4)).unwrap(),
        CommandOutcome::Matched(4)
    );
    assert!(interpret_outcome(&cmd, &json!("4")).is_err());
}

#[test]
fn test_browser_error_to_frame_error() {
    assert!(matches!(
        FrameError::from(BrowserError::PageNotFound("page_1".to_string())),
        FrameError::NotLive
    ));
    assert!(matches!(
        FrameError::from(BrowserError::NotConnected),
        FrameError::NotLive
    ));
    assert!(matches!(
        FrameError::from(BrowserError::Timeout("Request Runtime.callFunctionOn timed out".to_string())),
        FrameError::Timeout(_)
    ));
    assert!(matches!(
        FrameError::from(BrowserError::ChromeNotFound),
        FrameError::Backend(_)
    ));
}

#[tokio::test]
async fn test_frame_on_unknown_page_is_not_live() {
    let manager = Arc::new(BrowserManager::new(Default::default()));
    let frame = CdpFrame::new("page_9", manager);
    assert_eq!(frame.id(), "page_9");
    assert!(matches!(frame.current_url().await, Err(FrameError::NotLive)));
    assert!(matches!(frame.execute(&inject()).await, Err(FrameError::NotLive)));
}
