//! Fence stripping and JSON array extraction for raw model output.

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Strips one leading ```` ```json ```` or ```` ``` ```` marker and one trailing ```` ``` ````.
///
/// Only the outermost layer is removed, and only at the very start/end of the
/// whitespace-trimmed text. Text without fences passes through (trimmed).
/// Malformed JSON is not repaired.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix(JSON_FENCE)
        .or_else(|| text.strip_prefix(FENCE))
        .unwrap_or(text);
    let text = text.strip_suffix(FENCE).unwrap_or(text);
    text.trim()
}

/// Fence-strips `text`, then narrows it to the span from the first `[` to the last `]`.
///
/// Tolerates prose around the array. With no such bracket pair the stripped text
/// is returned as is.
pub fn extract_json_array(text: &str) -> &str {
    let text = strip_json_fences(text);
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
