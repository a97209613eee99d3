//! The catalog header, i.e. the translation of the empty msgid.

use tracing::warn;

use crate::{
    escape::escape_c_string,
    language::{Language, nplurals_from_expr},
};

pub const DEFAULT_CHARSET: &str = "UTF-8";
const CONTENT_TYPE_CHARSET: &str = "; charset=";

/// Header fields in file order plus the values derived from them.
///
/// The derived fields are the editable view; [`HeaderData::update_dict`]
/// writes them back into the ordered list before saving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderData {
    entries: Vec<(String, String)>,
    /// Comment lines written before the header entry.
    pub comment: String,
    pub project: String,
    pub creation_date: String,
    pub revision_date: String,
    pub translator: String,
    pub translator_email: String,
    pub language_team: String,
    pub charset: String,
    pub language: Option<Language>,
}

impl HeaderData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the header msgstr (`Key: Value\n` lines) and derives fields.
    pub fn from_string(&mut self, text: &str) {
        self.entries.clear();
        for line in text.split('\n').filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once(": ") else {
                warn!("malformed header: '{}'", line);
                continue;
            };
            let key = key.trim().to_string();
            let mut value = value.trim().to_string();
            if key == "Plural-Forms" && !value.is_empty() && !value.ends_with(';') {
                value.push(';');
            }
            self.entries.push((key, value));
        }
        self.parse_dict();
    }

    /// Serializes the header as `Key: Value\n` records joined by `line_delim`.
    pub fn to_string(&self, line_delim: &str) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&escape_c_string(key));
            out.push_str(": ");
            out.push_str(&escape_c_string(value));
            out.push_str("\\n");
            out.push_str(line_delim);
        }
        out
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn has_header(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Value of `key`, or an empty string if absent.
    pub fn get_header(&self, key: &str) -> &str {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// Sets `key`, keeping its position if already present.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Sets `key`, or removes it when `value` is empty.
    pub fn set_header_not_empty(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.delete_header(key);
        } else {
            self.set_header(key, value);
        }
    }

    pub fn delete_header(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Plural count declared by `Plural-Forms`, 2 if missing or unparsable.
    pub fn plural_forms_count(&self) -> usize {
        nplurals_from_expr(self.get_header("Plural-Forms")).unwrap_or(2)
    }

    /// Fills the derived fields from the ordered entries.
    pub fn parse_dict(&mut self) {
        self.project = self.get_header("Project-Id-Version").to_string();
        self.creation_date = self.get_header("POT-Creation-Date").to_string();
        self.revision_date = self.get_header("PO-Revision-Date").to_string();

        let translator = self.get_header("Last-Translator").to_string();
        match translator.split_once('<') {
            Some((name, rest)) => {
                self.translator = name.trim().to_string();
                self.translator_email = rest.split('>').next().unwrap_or_default().trim().to_string();
            }
            None => {
                self.translator = translator.trim().to_string();
                self.translator_email.clear();
            }
        }

        self.language_team = self.get_header("Language-Team").to_string();

        let content_type = self.get_header("Content-Type").to_string();
        self.charset = match content_type.split_once(CONTENT_TYPE_CHARSET) {
            Some((_, charset)) => charset.trim().to_string(),
            None => "ISO-8859-1".to_string(),
        };

        self.language = Language::try_parse(self.get_header("Language"));
    }

    /// Writes the derived fields back into the ordered entries.
    pub fn update_dict(&mut self) {
        self.set_header("Project-Id-Version", self.project.clone());
        self.set_header("POT-Creation-Date", self.creation_date.clone());
        self.set_header("PO-Revision-Date", self.revision_date.clone());

        if self.translator.is_empty() {
            self.delete_header("Last-Translator");
        } else if self.translator_email.is_empty() {
            self.set_header("Last-Translator", self.translator.clone());
        } else {
            let value = format!("{} <{}>", self.translator, self.translator_email);
            self.set_header("Last-Translator", value);
        }

        self.set_header_not_empty("Language-Team", self.language_team.clone());

        match &self.language {
            Some(lang) => {
                let code = lang.code().to_string();
                self.set_header("Language", code);
            }
            None => self.delete_header("Language"),
        }

        self.set_header("MIME-Version", "1.0");
        let charset = self.effective_charset().to_string();
        self.set_header("Content-Type", format!("text/plain{}{}", CONTENT_TYPE_CHARSET, charset));
        self.set_header("Content-Transfer-Encoding", "8bit");
    }

    /// Charset used for writing: UTF-8 if unset or the `CHARSET` placeholder.
    pub fn effective_charset(&self) -> &str {
        if self.charset.is_empty() || self.charset == "CHARSET" {
            DEFAULT_CHARSET
        } else {
            &self.charset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Project-Id-Version: demo 1.0\n\
        Last-Translator: Jane Doe <jane@example.com>\n\
        Language-Team: French\n\
        Language: fr\n\
        Content-Type: text/plain; charset=UTF-8\n\
        Plural-Forms: nplurals=2; plural=(n > 1)\n\
        X-Generator: hand\n";

    #[test]
    fn test_from_string_derives_fields() {
        let mut header = HeaderData::new();
        header.from_string(HEADER);
        assert_eq!(header.project, "demo 1.0");
        assert_eq!(header.translator, "Jane Doe");
        assert_eq!(header.translator_email, "jane@example.com");
        assert_eq!(header.language_team, "French");
        assert_eq!(header.charset, "UTF-8");
        assert_eq!(header.language.as_ref().map(Language::code), Some("fr"));
        assert_eq!(header.get_header("Plural-Forms"), "nplurals=2; plural=(n > 1);");
        assert_eq!(header.plural_forms_count(), 2);
        assert_eq!(header.entries().len(), 7);
    }

    #[test]
    fn test_missing_charset_is_latin1() {
        let mut header = HeaderData::new();
        header.from_string("Content-Type: text/plain\n");
        assert_eq!(header.charset, "ISO-8859-1");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let mut header = HeaderData::new();
        header.from_string("garbage\nLanguage: de\n");
        assert_eq!(header.entries(), &[("Language".to_string(), "de".to_string())]);
    }

    #[test]
    fn test_update_dict_keeps_order_and_appends() {
        let mut header = HeaderData::new();
        header.from_string(HEADER);
        header.translator_email.clear();
        header.charset = "CHARSET".to_string();
        header.update_dict();

        assert_eq!(header.get_header("Last-Translator"), "Jane Doe");
        assert_eq!(header.get_header("Content-Type"), "text/plain; charset=UTF-8");
        assert_eq!(header.entries()[0].0, "Project-Id-Version");
        assert_eq!(header.entries()[6].0, "X-Generator");
        assert_eq!(header.entries().last().unwrap().0, "Content-Transfer-Encoding");
    }

    #[test]
    fn test_to_string_escapes() {
        let mut header = HeaderData::new();
        header.set_header("X-Note", "say \"hi\"");
        assert_eq!(header.to_string("\n"), "X-Note: say \\\"hi\\\"\\n\n");
    }

    #[test]
    fn test_plural_forms_count_fallback() {
        let mut header = HeaderData::new();
        assert_eq!(header.plural_forms_count(), 2);
        header.set_header("Plural-Forms", "nplurals=INTEGER; plural=EXPRESSION;");
        assert_eq!(header.plural_forms_count(), 2);
        header.set_header("Plural-Forms", "nplurals=3; plural=n;");
        assert_eq!(header.plural_forms_count(), 3);
    }
}
