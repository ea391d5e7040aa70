//! Helpers for cleaning up raw model output

/// Maximum number of characters echoed back when output cannot be parsed
pub const PREVIEW_CHARS: usize = 200;

/// Remove a surrounding markdown code fence, if any
///
/// ```
/// use application::services::ai_output::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```vba\nSub A()\nEnd Sub\n```"), "Sub A()\nEnd Sub");
/// assert_eq!(strip_code_fences("  plain  "), "plain");
/// ```
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[start + 3..];
    // Skip the language tag on the opening line
    let body = after_open
        .find('\n')
        .map_or(after_open, |nl| &after_open[nl + 1..]);
    body.find("```")
        .map_or(body, |end| &body[..end])
        .trim()
}

/// The outermost JSON array in a text, from the first `[` to the last `]`
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let text = strip_code_fences(raw);
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// The BPMN document inside a text, from the XML declaration (or root
/// element) to the closing `definitions` tag
pub fn extract_xml_document(raw: &str) -> Option<&str> {
    let text = strip_code_fences(raw);
    let start = text
        .find("<?xml")
        .or_else(|| find_definitions_open(text))?;
    let close_start = text.rfind("definitions>")?;
    let end = close_start + "definitions>".len();
    (end > start).then(|| &text[start..end])
}

fn find_definitions_open(text: &str) -> Option<usize> {
    let pos = text.find("definitions")?;
    text[..pos].rfind('<')
}

/// First characters of the output, for diagnostics. Never longer than
/// [`PREVIEW_CHARS`], ellipsis included.
pub fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(PREVIEW_CHARS - 1).collect();
    cut.push('…');
    cut
}
