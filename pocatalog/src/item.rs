//! Catalog entries: translatable messages and obsolete blocks.

use std::fmt;

use serde::Serialize;

use crate::parser::{ParsedDeletedEntry, ParsedEntry};

const FIRST_STRONG_ISOLATE: char = '\u{2068}';
const POP_DIRECTIONAL_ISOLATE: char = '\u{2069}';

/// Severity of a validation annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Warning,
    Error,
}

/// A transient problem attached to an item by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn error(message: impl Into<String>) -> Self {
        Issue {
            kind: IssueKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Issue {
            kind: IssueKind::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::Warning => write!(f, "warning: {}", self.message),
            IssueKind::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// A single translatable message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogItem {
    /// Assigned in file order, starting at 1.
    pub id: u32,
    pub string: String,
    pub plural: Option<String>,
    /// One entry per plural form, or a single one for non-plural messages.
    pub translations: Vec<String>,
    /// `Some("")` is a real, empty context.
    pub context: Option<String>,
    fuzzy: bool,
    /// Flags other than `fuzzy`, in raw `, flag, flag` form.
    more_flags: String,
    /// Translator comment as raw `# ...` lines, each ending with `\n`.
    pub comment: String,
    pub extracted_comments: Vec<String>,
    /// Raw `#:` lines, exactly as read.
    pub references: Vec<String>,
    /// Raw `#|` lines.
    pub msgid_old: Vec<String>,
    pub line_number: usize,
    pub issue: Option<Issue>,
    pub pre_translated: bool,
}

impl CatalogItem {
    pub fn new(string: impl Into<String>) -> Self {
        CatalogItem {
            string: string.into(),
            translations: vec![String::new()],
            ..Default::default()
        }
    }

    pub fn from_parsed(id: u32, entry: ParsedEntry) -> Self {
        let mut item = CatalogItem {
            id,
            string: entry.msgid,
            plural: entry.msgid_plural,
            translations: entry.translations,
            context: entry.context,
            comment: entry.comment,
            extracted_comments: entry.extracted_comments,
            references: entry.references,
            msgid_old: entry.msgid_old,
            line_number: entry.line_number,
            ..Default::default()
        };
        if item.translations.is_empty() {
            item.translations.push(String::new());
        }
        item.set_flags(&entry.flags);
        item
    }

    pub fn has_plural(&self) -> bool {
        self.plural.is_some()
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// First (singular) translation.
    pub fn translation(&self) -> &str {
        self.translations.first().map(String::as_str).unwrap_or_default()
    }

    /// Sets the translation at `index`, growing the list as needed.
    pub fn set_translation(&mut self, index: usize, text: impl Into<String>) {
        if self.translations.len() <= index {
            self.translations.resize(index + 1, String::new());
        }
        self.translations[index] = text.into();
    }

    /// Pads plural translations with empty strings up to `count`.
    pub fn pad_translations(&mut self, count: usize) {
        if self.has_plural() && self.translations.len() < count {
            self.translations.resize(count, String::new());
        }
    }

    /// True when every translation slot is filled.
    pub fn is_translated(&self) -> bool {
        !self.translations.is_empty() && self.translations.iter().all(|t| !t.is_empty())
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub fn set_fuzzy(&mut self, fuzzy: bool) {
        self.fuzzy = fuzzy;
    }

    /// Flags in raw form, e.g. `", fuzzy, c-format"`; empty if there are none.
    pub fn flags(&self) -> String {
        let mut flags = String::new();
        if self.fuzzy {
            flags.push_str(", fuzzy");
        }
        flags.push_str(&self.more_flags);
        flags
    }

    /// Sets flags from their raw form (with or without the leading `#`).
    pub fn set_flags(&mut self, flags: &str) {
        self.fuzzy = false;
        self.more_flags.clear();
        let flags = flags.strip_prefix('#').unwrap_or(flags);
        for flag in flags.split([' ', ',']).filter(|f| !f.is_empty()) {
            if flag == "fuzzy" {
                self.fuzzy = true;
            } else {
                self.more_flags.push_str(", ");
                self.more_flags.push_str(flag);
            }
        }
    }

    /// Replaces one flag with another among the non-fuzzy flags.
    pub fn replace_flag(&mut self, from: &str, to: &str) {
        let flags: Vec<&str> = self
            .more_flags
            .split([' ', ','])
            .filter(|f| !f.is_empty())
            .map(|f| if f == from { to } else { f })
            .collect();
        self.more_flags = flags.iter().map(|f| format!(", {}", f)).collect();
    }

    /// Language of the format string flag, e.g. `php` for `php-format`.
    ///
    /// Negative flags like `no-c-format` yield `None`.
    pub fn format_flag(&self) -> Option<&str> {
        let flag = self
            .more_flags
            .split([' ', ','])
            .find(|f| f.ends_with("-format"))?;
        if flag.starts_with("no-") {
            return None;
        }
        flag.strip_suffix("-format")
    }

    /// References split on whitespace.
    ///
    /// Text between U+2068 and U+2069 isolates is taken literally, so file
    /// names with spaces survive; the isolate characters are dropped.
    pub fn parsed_references(&self) -> Vec<String> {
        let mut refs = Vec::new();
        for line in &self.references {
            let mut buf = String::new();
            let mut chars = line.trim().chars();
            while let Some(c) = chars.next() {
                if c.is_whitespace() {
                    if !buf.is_empty() {
                        refs.push(std::mem::take(&mut buf));
                    }
                } else if c == FIRST_STRONG_ISOLATE {
                    buf.extend(chars.by_ref().take_while(|&q| q != POP_DIRECTIONAL_ISOLATE));
                } else {
                    buf.push(c);
                }
            }
            if !buf.is_empty() {
                refs.push(buf);
            }
        }
        refs
    }

    /// Number of plural forms this item has translations for; 0 if singular.
    pub fn plural_forms_count(&self) -> usize {
        if self.has_plural() {
            self.translations.len()
        } else {
            0
        }
    }

    pub fn set_issue(&mut self, issue: Issue) {
        self.issue = Some(issue);
    }

    pub fn clear_issue(&mut self) {
        self.issue = None;
    }

    /// Identity of the message for duplicate detection and merge statistics.
    pub fn key(&self) -> (Option<&str>, &str) {
        (self.context.as_deref(), &self.string)
    }
}

/// An obsolete `#~` block, preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedItem {
    pub lines: Vec<String>,
    pub flags: String,
    pub comment: String,
    pub extracted_comments: Vec<String>,
    pub references: Vec<String>,
    pub line_number: usize,
}

impl From<ParsedDeletedEntry> for DeletedItem {
    fn from(entry: ParsedDeletedEntry) -> Self {
        DeletedItem {
            lines: entry.lines,
            flags: entry.flags,
            comment: entry.comment,
            extracted_comments: entry.extracted_comments,
            references: entry.references,
            line_number: entry.line_number,
        }
    }
}
