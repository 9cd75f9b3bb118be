//! Input utilities for the terminal interface.

/// Sanitize typed or pasted text before it enters a single-line field.
///
/// Tabs become 4 spaces, line breaks collapse to a single space (the draft
/// and username fields are single-line), and remaining control characters
/// are dropped so pasted escape sequences cannot corrupt the TUI.
pub fn sanitize_single_line(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\t' => sanitized.push_str("    "),
            '\n' => sanitized.push(' '),
            '\r' => {}
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }

    sanitized
}
