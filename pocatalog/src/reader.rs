//! Line reader feeding the PO parser.
//!
//! The PO format has no field recording the wrap width a file was written
//! with, so the reader watches line-break patterns while handing out lines and
//! infers it from them.

use serde::{Deserialize, Serialize};

/// Wrapping of quoted strings in a PO file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapWidth {
    /// Unknown; use the configured preference.
    #[default]
    Default,
    /// Strings are never wrapped.
    NoWrap,
    /// Strings are wrapped at the given column.
    Width(usize),
}

const MSGID_ALONE: &str = "msgid \"\"";
const MSGSTR_ALONE: &str = "msgstr \"\"";

/// Hands out logically significant lines and tracks wrapping metadata.
#[derive(Debug)]
pub struct LineReader<'a> {
    lines: &'a [String],
    next: usize,
    last_hard_wrapped: bool,
    previous_hard_wrapped: bool,
    detected_wrapped_lines: bool,
    detected_width: Option<usize>,
}

impl<'a> LineReader<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        LineReader {
            lines,
            next: 0,
            last_hard_wrapped: false,
            previous_hard_wrapped: false,
            detected_wrapped_lines: false,
            detected_width: None,
        }
    }

    /// Returns the next non-blank line, trimmed if it has surrounding
    /// whitespace, or `None` at end of input.
    pub fn read_line(&mut self) -> Option<&'a str> {
        self.previous_hard_wrapped = self.last_hard_wrapped;
        self.last_hard_wrapped = false;

        while let Some(ln) = self.lines.get(self.next) {
            self.next += 1;
            if ln.is_empty() {
                continue;
            }

            // gettext doesn't wrap comments, so they say nothing about the width
            if !ln.starts_with("#. ") && !ln.starts_with("# ") {
                if ln.ends_with("\\n\"") || ln == MSGID_ALONE || ln == MSGSTR_ALONE {
                    self.last_hard_wrapped = true;
                } else if let Some(space) = ln.rfind(' ') {
                    // "2" leaves out unwrappable reference lines like "#: path"
                    if ln[..space].chars().count() > 2 {
                        let width = ln.chars().count();
                        self.detected_width = Some(self.detected_width.map_or(width, |w| w.max(width)));
                    }
                }
            }

            let starts_ws = ln.starts_with(char::is_whitespace);
            let ends_ws = ln.ends_with(char::is_whitespace);
            if starts_ws || ends_ws {
                let stripped = ln.trim();
                if !stripped.is_empty() {
                    return Some(stripped);
                }
            } else {
                return Some(ln.as_str());
            }
        }

        None
    }

    /// 1-based number of the line most recently returned by [`read_line`](Self::read_line).
    pub fn current_line_number(&self) -> usize {
        self.next
    }

    /// Records that a quoted continuation line was just consumed.
    ///
    /// Continuations that don't follow a hard break (`\n` or the header
    /// sentinels) can only come from wrapping.
    pub fn possible_wrapped_line(&mut self) {
        if !self.previous_hard_wrapped {
            self.detected_wrapped_lines = true;
        }
    }

    pub fn wrapping_width(&self) -> WrapWidth {
        if !self.detected_wrapped_lines {
            return WrapWidth::NoWrap;
        }
        match self.detected_width {
            Some(width) => WrapWidth::Width(width),
            None => WrapWidth::Default,
        }
    }
}
