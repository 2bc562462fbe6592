//! Locating the JSON payload inside a model response.

const FENCE: &str = "```";

/// Find the payload substring in a raw response.
///
/// Content between the first pair of code fences wins when it contains an
/// object. A language tag on the opening fence line (`json`, `JSON`, ...) is
/// skipped. Otherwise the span from the first `{` to the last `}` is used.
///
/// Returns `None` when neither is present.
///
/// # Examples
///
/// ```
/// use sibyl_analysis::locate_payload;
///
/// let fenced = "Result:\n```json\n{\"a\": 1}\n```\nThanks!";
/// assert_eq!(locate_payload(fenced), Some("{\"a\": 1}"));
///
/// let bare = "Sure! {\"a\": {\"b\": 2}} Hope that helps.";
/// assert_eq!(locate_payload(bare), Some("{\"a\": {\"b\": 2}}"));
///
/// assert_eq!(locate_payload("no payload here"), None);
/// ```
pub fn locate_payload(raw: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(raw) {
        if fenced.contains('{') {
            return Some(fenced);
        }
    }
    brace_span(raw)
}

/// Content of the first complete fence pair, trimmed.
fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find(FENCE)? + FENCE.len();
    let after_open = &raw[open..];

    // Skip a language tag that sits alone on the fence line
    let body_start = match after_open.find('\n') {
        Some(newline) if is_language_tag(&after_open[..newline]) => newline + 1,
        _ => 0,
    };
    let body = &after_open[body_start..];

    let close = body.find(FENCE)?;
    Some(body[..close].trim())
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// First `{` through last `}`.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
