//! Line-oriented text files with charset handling.
//!
//! Decoding is done line by line so that a line which is not valid in the
//! declared charset ends up empty instead of poisoning the whole file. This is
//! what makes [`verify_charset`] possible: comparing against a single-byte
//! decoding of the same bytes reveals mis-declared charsets.

use std::{borrow::Cow, fmt};

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// End-of-line convention of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Unix,
    #[serde(alias = "win", alias = "windows")]
    Dos,
    /// No line terminators were found.
    None,
}

impl LineEnding {
    pub fn eol(self) -> &'static str {
        match self {
            LineEnding::Dos => "\r\n",
            LineEnding::Unix | LineEnding::None => "\n",
        }
    }
}

/// A problem found by [`verify_charset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CharsetIssue {
    /// The declared charset produced a different number of lines.
    LineCountMismatch { expected: usize, actual: usize },
    /// A non-empty line (1-based) could not be decoded.
    CorruptedLine { line: usize },
    /// The declared charset is not known; the file was read as UTF-8.
    UnknownCharset { charset: String },
}

impl fmt::Display for CharsetIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharsetIssue::LineCountMismatch { expected, actual } => {
                write!(f, "expected {} lines, decoded {}", expected, actual)
            }
            CharsetIssue::CorruptedLine { line } => write!(f, "line {} couldn't be decoded", line),
            CharsetIssue::UnknownCharset { charset } => write!(f, "unknown charset `{}`", charset),
        }
    }
}

/// Decoded lines of a text file plus the line terminators that were seen.
#[derive(Debug, Clone, Default)]
pub struct TextFile {
    lines: Vec<String>,
    unix_count: usize,
    dos_count: usize,
    mac_count: usize,
}

impl TextFile {
    /// Decodes `bytes` as ISO-8859-1 compatible single-byte text; never fails.
    pub fn decode_raw(bytes: &[u8]) -> Self {
        Self::split_and_decode(bytes, |line| {
            Some(WINDOWS_1252.decode_without_bom_handling(line).0)
        })
    }

    /// Decodes `bytes` using the charset named `charset`.
    ///
    /// Lines that are not valid in that charset come out empty.
    pub fn decode(bytes: &[u8], charset: &str) -> Result<Self, Error> {
        let encoding = encoding_for(charset)?;

        if !encoding.is_ascii_compatible() {
            // UTF-16 and friends can't be split on raw bytes.
            let (text, _, _) = encoding.decode(bytes);
            let mut file = Self::split_and_decode(text.as_bytes(), |line| {
                Some(String::from_utf8_lossy(line))
            });
            if file.lines.first().is_some_and(|l| l.starts_with('\u{feff}')) {
                file.lines[0] = file.lines[0].trim_start_matches('\u{feff}').to_string();
            }
            return Ok(file);
        }

        let bytes = if encoding == UTF_8 {
            bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
        } else {
            bytes
        };

        Ok(Self::split_and_decode(bytes, |line| {
            encoding.decode_without_bom_handling_and_without_replacement(line)
        }))
    }

    /// Builds a text file from already decoded lines.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let unix_count = lines.len();
        TextFile {
            lines,
            unix_count,
            dos_count: 0,
            mac_count: 0,
        }
    }

    fn split_and_decode<'a, F>(bytes: &'a [u8], mut decode: F) -> Self
    where
        F: FnMut(&'a [u8]) -> Option<Cow<'a, str>>,
    {
        let mut file = TextFile::default();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    file.unix_count += 1;
                    file.push_line(decode(&bytes[start..i]));
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    let end = i;
                    if bytes.get(i + 1) == Some(&b'\n') {
                        file.dos_count += 1;
                        i += 2;
                    } else {
                        file.mac_count += 1;
                        i += 1;
                    }
                    file.push_line(decode(&bytes[start..end]));
                    start = i;
                }
                _ => i += 1,
            }
        }
        if start < bytes.len() {
            file.push_line(decode(&bytes[start..]));
        }

        file
    }

    fn push_line(&mut self, decoded: Option<Cow<'_, str>>) {
        self.lines
            .push(decoded.map(Cow::into_owned).unwrap_or_default());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Guesses the line ending convention from the most frequent terminator.
    ///
    /// Old Mac-style endings are reported as [`LineEnding::Unix`]: nothing
    /// produces them anymore and the gettext tools choke on them.
    pub fn guess_line_ending(&self) -> LineEnding {
        let (unix, dos, mac) = (self.unix_count, self.dos_count, self.mac_count);
        if unix + dos + mac == 0 {
            return LineEnding::None;
        }
        if dos > unix && dos > mac {
            LineEnding::Dos
        } else {
            LineEnding::Unix
        }
    }
}

/// Looks up an encoding by its charset label (case-insensitive).
pub fn encoding_for(charset: &str) -> Result<&'static Encoding, Error> {
    Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| Error::Charset(format!("unknown charset `{}`", charset)))
}

pub fn is_utf8_charset(charset: &str) -> bool {
    let lower = charset.trim().to_ascii_lowercase();
    lower == "utf-8" || lower == "utf8"
}

/// Checks that every non-empty line under the declared charset matches the
/// raw single-byte decoding of the same file.
pub fn verify_charset(decoded: &TextFile, raw: &TextFile) -> Vec<CharsetIssue> {
    if decoded.line_count() != raw.line_count() {
        return vec![CharsetIssue::LineCountMismatch {
            expected: raw.line_count(),
            actual: decoded.line_count(),
        }];
    }

    decoded
        .lines()
        .iter()
        .zip(raw.lines())
        .enumerate()
        .filter(|(_, (ours, theirs))| ours.is_empty() && !theirs.is_empty())
        .map(|(i, _)| CharsetIssue::CorruptedLine { line: i + 1 })
        .collect()
}

/// Returns true if every line can be represented in `charset`.
pub fn can_encode(lines: &[String], charset: &str) -> bool {
    if is_utf8_charset(charset) {
        return true;
    }
    let Ok(encoding) = encoding_for(charset) else {
        return false;
    };
    if encoding.output_encoding() != encoding {
        // UTF-16 variants cover all of Unicode.
        return true;
    }
    lines.iter().all(|line| {
        let (_, _, had_errors) = encoding.encode(line);
        !had_errors
    })
}

/// Joins `lines`, terminating each one with `ending`, and encodes the result.
pub fn encode_lines(lines: &[String], ending: LineEnding, charset: &str) -> Result<Vec<u8>, Error> {
    let eol = ending.eol();
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
    for line in lines {
        text.push_str(line);
        text.push_str(eol);
    }
    encode_text(&text, charset)
}

/// Encodes `text` into `charset`.
pub fn encode_text(text: &str, charset: &str) -> Result<Vec<u8>, Error> {
    let encoding = encoding_for(charset)?;
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(Error::Charset(format!(
            "text can't be encoded in `{}`",
            charset
        )));
    }
    Ok(bytes.into_owned())
}

/// Rewrites Unix line endings in `bytes` to `ending`.
pub fn convert_line_endings(bytes: &[u8], ending: LineEnding) -> Vec<u8> {
    if ending != LineEnding::Dos {
        return bytes.to_vec();
    }
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 32);
    let mut prev = 0u8;
    for &b in bytes {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}
