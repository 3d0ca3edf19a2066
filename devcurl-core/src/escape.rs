// Escaping primitives for the generated code. The two escapers are not interchangeable.

/// Escape a value for use inside a single-quoted shell string.
///
/// Each `'` becomes `'\''`: close the quote, emit an escaped quote, reopen.
pub fn shell_single_quote(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Wrap a value in single quotes for the shell
pub fn shell_quoted(value: &str) -> String {
    format!("'{}'", shell_single_quote(value))
}

/// Escape a value for use inside a single-quoted JavaScript string literal
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a value in single quotes as a JavaScript string literal
pub fn js_quoted(value: &str) -> String {
    format!("'{}'", string_literal(value))
}
