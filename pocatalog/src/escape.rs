//! C-style string escaping as used by quoted PO string literals.

/// Un-escapes the body of a quoted PO string (without the surrounding quotes).
///
/// Unknown escape sequences are kept verbatim, backslash included.
pub fn unescape_c_string(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('?') => out.push('?'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0C'),
            Some('v') => out.push('\x0B'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Escapes `s` so that it can be placed between double quotes in a PO file.
pub fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    escape_c_string_into(s, &mut out);
    out
}

fn escape_c_string_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0B' => out.push_str("\\v"),
            _ => out.push(c),
        }
    }
}

/// Calls `f(piece, is_last)` for every `\n`-separated piece of `text`.
///
/// A trailing newline does not produce an empty final piece, and empty text
/// produces no pieces at all.
pub fn split_into_lines<F>(text: &str, mut f: F)
where
    F: FnMut(&str, bool),
{
    if text.is_empty() {
        return;
    }

    let mut rest = text;
    while let Some(pos) = rest.find('\n') {
        f(&rest[..pos], false);
        rest = &rest[pos + 1..];
    }
    if !rest.is_empty() {
        f(rest, true);
    }
}

/// Appends every line of a multi-line `text` to `lines`.
pub fn push_multi_lines(lines: &mut Vec<String>, text: &str) {
    split_into_lines(text, |s, _| lines.push(s.to_string()));
}

/// Escapes `text` and breaks it after every embedded newline into separate
/// quoted segments, e.g. `a\nb` becomes `a\n"` + newline + `"b`.
///
/// The result is meant to be wrapped as `msgid "` + result + `"`.
pub fn format_string_for_file(text: &str) -> String {
    let mut s = String::with_capacity(text.len() + 16);

    split_into_lines(text, |piece, last| {
        if !s.is_empty() {
            s.push_str("\"\n\"");
        }
        escape_c_string_into(piece, &mut s);
        if !last {
            s.push_str("\\n");
        }
    });

    s
}
