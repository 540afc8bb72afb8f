//! Pull a JSON payload out of model output
//!
//! Structured-output mode normally returns bare JSON, but models still wrap
//! it in markdown fences or a sentence now and then.

/// Locate the first complete JSON array in `text`.
///
/// A markdown code fence (```` ```json ```` or plain) is stripped first.
/// Brackets inside string literals are ignored, so trailing prose that
/// happens to contain `]` does not widen the match.
pub fn extract_json_array(text: &str) -> Result<&str, String> {
    let body = strip_code_fence(text);
    let start = body
        .find('[')
        .ok_or_else(|| "No JSON array found in response".to_string())?;
    let len = closing_bracket(&body[start..])
        .ok_or_else(|| "Unterminated JSON array in response".to_string())?;
    Ok(&body[start..=start + len])
}

fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // drop the language tag line, if any
    let content = match after.find('\n') {
        Some(newline) => &after[newline + 1..],
        None => after,
    };
    match content.find("```") {
        Some(close) => &content[..close],
        None => content,
    }
}

/// Offset of the `]` that closes the array opening at offset 0
fn closing_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
