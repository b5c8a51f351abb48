//! Page functions run through `Runtime.callFunctionOn` with `this` bound to
//! the page's `document`.
//!
//! Each one is a fixed function declaration: selectors and prompt text arrive
//! as call arguments and are never spliced into the source.

/// `(selector, strategy, text) -> 'done' | 'not_found'`
///
/// Clears the input and inserts `text` using one of the recipes the chat
/// sites accept: `editing_command`, `paste`, `native_value` or `text_node`.
pub const INJECT: &str = r#"function (selector, strategy, text) {
    const doc = this;
    const el = doc.querySelector(selector);
    if (!el) {
        return 'not_found';
    }
    el.focus();
    const fire = (type) => el.dispatchEvent(new Event(type, { bubbles: true }));
    const clear = () => {
        doc.execCommand('selectAll', false, null);
        doc.execCommand('delete', false, null);
    };
    switch (strategy) {
        case 'native_value': {
            const proto = el instanceof HTMLTextAreaElement
                ? HTMLTextAreaElement.prototype
                : HTMLInputElement.prototype;
            const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
            if (descriptor && descriptor.set) {
                descriptor.set.call(el, text);
            } else {
                el.value = text;
            }
            fire('input');
            fire('change');
            break;
        }
        case 'paste': {
            clear();
            const data = new DataTransfer();
            data.setData('text/plain', text);
            el.dispatchEvent(new ClipboardEvent('paste', {
                bubbles: true,
                cancelable: true,
                clipboardData: data,
            }));
            break;
        }
        case 'text_node': {
            el.innerHTML = '';
            el.appendChild(doc.createTextNode(text));
            fire('input');
            fire('change');
            break;
        }
        default: {
            clear();
            doc.execCommand('insertText', false, text);
            fire('input');
        }
    }
    return 'done';
}"#;

/// `(selector) -> 'done' | 'not_found'`
pub const SEND_CLICK: &str = r#"function (selector) {
    const el = this.querySelector(selector);
    if (!el) {
        return 'not_found';
    }
    for (const type of ['mousedown', 'mouseup']) {
        el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window }));
    }
    el.click();
    return 'done';
}"#;

/// `(selector) -> 'done' | 'not_found'`. Focus only, the key press follows over CDP.
pub const FOCUS: &str = r#"function (selector) {
    const el = this.querySelector(selector);
    if (!el) {
        return 'not_found';
    }
    el.focus();
    return 'done';
}"#;

/// `(selector, visibleOnly) -> string | null`
///
/// Text of the last matching element in document order.
pub const READ_LAST: &str = r#"function (selector, visibleOnly) {
    let elements = Array.from(this.querySelectorAll(selector));
    if (visibleOnly) {
        elements = elements.filter((el) => el.offsetParent !== null);
    }
    if (elements.length === 0) {
        return null;
    }
    const last = elements[elements.length - 1];
    const text = last.innerText || last.textContent || '';
    return text.length > 0 ? text : null;
}"#;

/// `(selector, durationMs) -> number`
///
/// Outlines every match in red and restores the old outline afterwards.
pub const HIGHLIGHT: &str = r#"function (selector, durationMs) {
    const elements = Array.from(this.querySelectorAll(selector));
    for (const el of elements) {
        const previous = el.style.outline;
        el.style.outline = '2px solid red';
        setTimeout(() => {
            el.style.outline = previous;
        }, durationMs);
    }
    return elements.length;
}"#;
