//! Full-width text sanitizer.

/// Replace quotes, backticks, backslashes, dollars and line breaks with
/// full-width look-alikes. Idempotent.
pub fn fullwidth(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push('＂'),
            '\'' => out.push('＇'),
            '`' => out.push('｀'),
            '\\' => out.push('＼'),
            '$' => out.push('＄'),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('↵');
            }
            '\n' => out.push('↵'),
            other => out.push(other),
        }
    }
    out
}
