//! Minimal HTML rendering of assembled document text.

use crate::assemble::{PAGE_SEPARATOR, PARAGRAPH_SEPARATOR};

const DOCUMENT_OPEN: &str = "<html><body>";
const DOCUMENT_CLOSE: &str = "</body></html>";
const LINE_BREAK: &str = "<br>";

/// Escape `&`, `<` and `>`. `&` goes first so the entities produced for `<`
/// and `>` are never escaped again.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render assembled text as a minimal HTML document.
///
/// Each `"\n\n"`-delimited chunk becomes a `<p>` element with its remaining
/// newlines turned into `<br>`. Chunks that are blank after trimming are dropped.
pub fn to_html(text: &str) -> String {
    let escaped = escape_html(text);

    let mut html = String::with_capacity(escaped.len() + DOCUMENT_OPEN.len() + DOCUMENT_CLOSE.len());
    html.push_str(DOCUMENT_OPEN);
    for chunk in escaped.split(PAGE_SEPARATOR) {
        if is_blank(chunk) {
            continue;
        }
        html.push_str("<p>");
        html.push_str(&chunk.replace(PARAGRAPH_SEPARATOR, LINE_BREAK));
        html.push_str("</p>");
    }
    html.push_str(DOCUMENT_CLOSE);
    html
}

/// Only whitespace, counting the information separators U+001C..U+001F.
fn is_blank(chunk: &str) -> bool {
    chunk
        .chars()
        .all(|c| c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c))
}
