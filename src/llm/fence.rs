//! Removal of a Markdown code fence that models sometimes wrap around JSON.

const FENCE: &str = "```";

/// Returns the body of a fenced block, or the trimmed input when it is not
/// wrapped in a fence. A language tag after the opening fence is dropped.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() < FENCE.len() * 2 || !trimmed.starts_with(FENCE) || !trimmed.ends_with(FENCE) {
        return trimmed;
    }

    let inner = &trimmed[FENCE.len()..trimmed.len() - FENCE.len()];
    // language tag, possibly glued to the body: ```json{...}
    let tag_len = inner
        .find(|c: char| !is_tag_char(c))
        .unwrap_or(inner.len());
    inner[tag_len..].trim()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
