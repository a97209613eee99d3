//! PO syntax state machine.
//!
//! [`PoParser`] walks the lines handed out by [`LineReader`] and reports every
//! completed message to a [`ParserSink`]. Consumers only decide what to do with
//! the entries; the grammar lives here.

use std::ops::ControlFlow;

use crate::{
    error::Error,
    escape::unescape_c_string,
    reader::{LineReader, WrapWidth},
};

/// A message as read from the file, before it becomes a catalog item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntry {
    pub msgid: String,
    /// `Some` if the message has a `msgid_plural`.
    pub msgid_plural: Option<String>,
    /// `Some` if the message has a `msgctxt`, even an empty one.
    pub context: Option<String>,
    pub translations: Vec<String>,
    /// Raw flags text, e.g. `", fuzzy, c-format"`.
    pub flags: String,
    pub references: Vec<String>,
    /// Translator comment lines, each terminated by `\n`.
    pub comment: String,
    pub extracted_comments: Vec<String>,
    pub msgid_old: Vec<String>,
    /// 1-based line of the `msgid` (or `msgid_plural`) keyword.
    pub line_number: usize,
}

impl ParsedEntry {
    /// The header is the message with an empty msgid and no context.
    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.context.is_none()
    }
}

/// An obsolete `#~` block, kept as raw lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDeletedEntry {
    pub lines: Vec<String>,
    pub flags: String,
    pub references: Vec<String>,
    pub comment: String,
    pub extracted_comments: Vec<String>,
    pub line_number: usize,
}

/// Receives parsed messages.
///
/// Returning [`ControlFlow::Break`] stops parsing early; this is not an error.
pub trait ParserSink {
    fn on_entry(&mut self, entry: ParsedEntry) -> ControlFlow<()>;

    fn on_deleted_entry(&mut self, _entry: ParsedDeletedEntry) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called for the header when the parser is told to ignore it.
    fn on_ignored_entry(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub ignore_header: bool,
    pub ignore_translations: bool,
}

const PREFIX_FLAGS: &str = "#, ";
const PREFIX_AUTOCOMMENTS: &str = "#. ";
const PREFIX_AUTOCOMMENTS_EMPTY: &str = "#.";
const PREFIX_REFERENCES: &str = "#: ";
const PREFIX_PREV_MSGID: &str = "#| ";
const PREFIX_MSGCTXT: &str = "msgctxt \"";
const PREFIX_MSGID: &str = "msgid \"";
const PREFIX_MSGID_PLURAL: &str = "msgid_plural \"";
const PREFIX_MSGSTR: &str = "msgstr \"";
const PREFIX_MSGSTR_PLURAL: &str = "msgstr[";
const PREFIX_DELETED: &str = "#~";

/// Matches `pattern` at the start of `input` and returns the remainder.
///
/// A space in `pattern` matches any run of whitespace (exactly one character
/// if `preserve_whitespace` is set). Without `preserve_whitespace` the
/// remainder has trailing whitespace removed.
fn read_param<'l>(input: &'l str, pattern: &str, preserve_whitespace: bool) -> Option<&'l str> {
    if input.len() < pattern.len() {
        return None;
    }

    let mut chars = input.char_indices().peekable();
    let mut pos = 0;
    for pat in pattern.chars() {
        let (i, c) = chars.next()?;
        pos = i + c.len_utf8();
        if pat == ' ' {
            if !c.is_whitespace() {
                return None;
            }
            if !preserve_whitespace {
                while let Some(&(j, d)) = chars.peek() {
                    if !d.is_whitespace() {
                        break;
                    }
                    chars.next();
                    pos = j + d.len_utf8();
                    if chars.peek().is_none() {
                        return None;
                    }
                }
            }
        } else if c != pat {
            return None;
        }
    }

    let rest = &input[pos..];
    Some(if preserve_whitespace {
        rest
    } else {
        rest.trim_end()
    })
}

/// Drops the last character (the closing quote of a string literal).
fn strip_last(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str()
}

fn is_empty_special_tag(line: &str) -> bool {
    matches!(line, "#," | "#:" | "#|")
}

fn is_quoted(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('"') && line.ends_with('"')
}

/// Fields collected for the message currently being read.
#[derive(Default)]
struct Pending {
    flags: String,
    msgid: String,
    msgid_plural: Option<String>,
    context: Option<String>,
    comment: String,
    references: Vec<String>,
    extracted_comments: Vec<String>,
    translations: Vec<String>,
    msgid_old: Vec<String>,
    line_number: usize,
}

impl Pending {
    fn take_entry(&mut self) -> ParsedEntry {
        let pending = std::mem::take(self);
        ParsedEntry {
            msgid: pending.msgid,
            msgid_plural: pending.msgid_plural,
            context: pending.context,
            translations: pending.translations,
            flags: pending.flags,
            references: pending.references,
            comment: pending.comment,
            extracted_comments: pending.extracted_comments,
            msgid_old: pending.msgid_old,
            line_number: pending.line_number,
        }
    }
}

/// The PO grammar state machine.
pub struct PoParser<'a> {
    reader: LineReader<'a>,
    options: ParserOptions,
}

impl<'a> PoParser<'a> {
    pub fn new(lines: &'a [String], options: ParserOptions) -> Self {
        PoParser {
            reader: LineReader::new(lines),
            options,
        }
    }

    /// Wrap width inferred from the lines read so far.
    pub fn wrapping_width(&self) -> WrapWidth {
        self.reader.wrapping_width()
    }

    /// Reads quoted continuation lines and appends them to `value`.
    ///
    /// Returns the first line that is not a continuation.
    fn read_continuation(&mut self, value: &mut String) -> Option<&'a str> {
        loop {
            let line = self.reader.read_line()?;
            let line = line.strip_prefix('\t').unwrap_or(line);
            if is_quoted(line) {
                value.push_str(&unescape_c_string(&line[1..line.len() - 1]));
                self.reader.possible_wrapped_line();
            } else {
                return Some(line);
            }
        }
    }

    /// Parses the whole input, feeding `sink`.
    ///
    /// Fails only on the structural errors of mixing singular and plural
    /// `msgstr` forms; everything else is tolerated.
    pub fn parse<S: ParserSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), Error> {
        let mut pending = Pending::default();
        let mut line = self.reader.read_line();

        while let Some(mut ln) = line {
            // Empty special tags carry nothing; extracted comments are kept though.
            while is_empty_special_tag(ln) {
                match self.reader.read_line() {
                    Some(next) => ln = next,
                    None => return Ok(()),
                }
            }

            // Only one flags line is kept per message; the last one wins.
            while let Some(flags) = read_param(ln, PREFIX_FLAGS, false) {
                pending.flags = format!(", {}", flags);
                match self.reader.read_line() {
                    Some(next) => ln = next,
                    None => return Ok(()),
                }
            }

            if let Some(comment) = read_param(ln, PREFIX_AUTOCOMMENTS, true)
                .or_else(|| read_param(ln, PREFIX_AUTOCOMMENTS_EMPTY, true))
            {
                pending.extracted_comments.push(comment.to_string());
                line = self.reader.read_line();
            } else if let Some(reference) = read_param(ln, PREFIX_REFERENCES, true) {
                // References are stored verbatim, they are never modified.
                pending.references.push(reference.to_string());
                line = self.reader.read_line();
            } else if let Some(old) = read_param(ln, PREFIX_PREV_MSGID, false) {
                pending.msgid_old.push(old.to_string());
                line = self.reader.read_line();
            } else if let Some(rest) = read_param(ln, PREFIX_MSGCTXT, false) {
                let mut context = unescape_c_string(strip_last(rest));
                line = self.read_continuation(&mut context);
                pending.context = Some(context);
            } else if let Some(rest) = read_param(ln, PREFIX_MSGID, false) {
                pending.line_number = self.reader.current_line_number();
                let mut msgid = unescape_c_string(strip_last(rest));
                line = self.read_continuation(&mut msgid);
                pending.msgid = msgid;
            } else if let Some(rest) = read_param(ln, PREFIX_MSGID_PLURAL, false) {
                pending.line_number = self.reader.current_line_number();
                let mut plural = unescape_c_string(strip_last(rest));
                line = self.read_continuation(&mut plural);
                pending.msgid_plural = Some(plural);
            } else if let Some(rest) = read_param(ln, PREFIX_MSGSTR, false) {
                if pending.msgid_plural.is_some() {
                    return Err(Error::parse_error(
                        self.reader.current_line_number(),
                        "singular form msgstr used together with msgid_plural",
                    ));
                }

                let mut translation = unescape_c_string(strip_last(rest));
                line = self.read_continuation(&mut translation);
                pending.translations.push(translation);

                let is_header = pending.msgid.is_empty() && pending.context.is_none();
                if self.options.ignore_header && is_header {
                    pending = Pending::default();
                    sink.on_ignored_entry();
                } else {
                    if !pending.msgid.is_empty() && self.options.ignore_translations {
                        pending.translations.clear();
                    }
                    if sink.on_entry(pending.take_entry()).is_break() {
                        return Ok(());
                    }
                }
            } else if let Some(rest) = read_param(ln, PREFIX_MSGSTR_PLURAL, false) {
                if pending.msgid_plural.is_none() {
                    return Err(Error::parse_error(
                        self.reader.current_line_number(),
                        "plural form msgstr used without msgid_plural",
                    ));
                }

                let mut label = plural_label(rest);
                line = Some(ln);
                while let Some(rest) = line.and_then(|l| read_param(l, &label, false)) {
                    let mut translation = unescape_c_string(strip_last(rest));
                    line = None;
                    while let Some(next) = self.reader.read_line() {
                        let next = next.trim_start();
                        if is_quoted(next) {
                            translation.push_str(&unescape_c_string(&next[1..next.len() - 1]));
                            self.reader.possible_wrapped_line();
                        } else {
                            if let Some(rest) = read_param(next, PREFIX_MSGSTR_PLURAL, false) {
                                label = plural_label(rest);
                            }
                            line = Some(next);
                            break;
                        }
                    }
                    pending.translations.push(translation);
                }

                if self.options.ignore_translations {
                    pending.translations.clear();
                }
                if sink.on_entry(pending.take_entry()).is_break() {
                    return Ok(());
                }
            } else if read_param(ln, PREFIX_DELETED, false).is_some() {
                let line_number = self.reader.current_line_number();
                let mut deleted_lines = vec![ln.to_string()];
                let mut seen_msgstr = is_deleted_msgstr(ln);
                line = None;
                while let Some(next) = self.reader.read_line() {
                    // A blank line may be missing between two obsolete
                    // messages; a new one starts once the previous had its msgstr.
                    if read_param(next, PREFIX_DELETED, false).is_none()
                        || (seen_msgstr && starts_deleted_message(next))
                    {
                        line = Some(next);
                        break;
                    }
                    seen_msgstr |= is_deleted_msgstr(next);
                    deleted_lines.push(next.to_string());
                }

                let pending = std::mem::take(&mut pending);
                if !self.options.ignore_translations {
                    let deleted = ParsedDeletedEntry {
                        lines: deleted_lines,
                        flags: pending.flags,
                        references: pending.references,
                        comment: pending.comment,
                        extracted_comments: pending.extracted_comments,
                        line_number,
                    };
                    if sink.on_deleted_entry(deleted).is_break() {
                        return Ok(());
                    }
                }
            } else if ln.starts_with('#') {
                let mut read_new_line = false;
                let mut current = Some(ln);
                while let Some(comment) = current {
                    if !is_translator_comment(comment) {
                        break;
                    }
                    pending.comment.push_str(comment);
                    pending.comment.push('\n');
                    read_new_line = true;
                    current = self.reader.read_line();
                }
                line = if read_new_line {
                    current
                } else {
                    self.reader.read_line()
                };
            } else {
                line = self.reader.read_line();
            }
        }

        Ok(())
    }
}

fn plural_label(rest: &str) -> String {
    let index = rest.split(']').next().unwrap_or_default();
    format!("{}{}] \"", PREFIX_MSGSTR_PLURAL, index)
}

fn is_translator_comment(line: &str) -> bool {
    let mut chars = line.chars();
    chars.next() == Some('#') && !matches!(chars.next(), Some(',' | ':' | '.' | '~'))
}

fn is_deleted_msgstr(line: &str) -> bool {
    read_param(line, "#~ msgstr", false).is_some()
}

fn starts_deleted_message(line: &str) -> bool {
    read_param(line, "#~ msgid \"", false).is_some()
        || read_param(line, "#~ msgctxt \"", false).is_some()
        || line.starts_with("#~|")
}
