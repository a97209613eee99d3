//! Loading catalogs from PO/POT files.

use std::{fs, ops::ControlFlow, path::Path};

use tracing::{debug, error, warn};

use crate::{
    catalog::{Catalog, FileType},
    config::LoadFlags,
    error::Error,
    header::DEFAULT_CHARSET,
    item::{CatalogItem, DeletedItem},
    language::Language,
    parser::{ParsedDeletedEntry, ParsedEntry, ParserOptions, ParserSink, PoParser},
    text_file::{CharsetIssue, TextFile, verify_charset},
};

const MSGCAT_CONFLICT_MARKER: &str = "#-#-#-#-#";

/// Reads just the header to find out the declared charset.
struct CharsetSniffer {
    charset: String,
}

impl ParserSink for CharsetSniffer {
    fn on_entry(&mut self, entry: ParsedEntry) -> ControlFlow<()> {
        if !entry.is_header() {
            return ControlFlow::Continue(());
        }

        let header = entry.translations.first().map(String::as_str).unwrap_or_default();
        for line in header.split('\n') {
            if let Some(content_type) = line.strip_prefix("Content-Type:") {
                if let Some((_, charset)) = content_type.split_once("charset=") {
                    let charset = charset.trim();
                    self.charset = if charset == "CHARSET" {
                        "ISO-8859-1".to_string()
                    } else {
                        charset.to_string()
                    };
                }
            }
        }
        ControlFlow::Break(())
    }
}

/// Charset declared in the header of the raw (single-byte decoded) file.
fn sniff_charset(raw: &TextFile) -> String {
    let mut sniffer = CharsetSniffer {
        charset: DEFAULT_CHARSET.to_string(),
    };
    // broken files still tell us their charset if they got that far
    if let Err(e) = PoParser::new(raw.lines(), ParserOptions::default()).parse(&mut sniffer) {
        debug!("charset detection stopped early: {}", e);
    }
    sniffer.charset
}

fn push_comment_line(comment: &mut String, line: &str) {
    if !comment.is_empty() && !comment.ends_with('\n') {
        comment.push('\n');
    }
    comment.push_str(line);
    comment.push('\n');
}

/// Builds catalog items from parsed entries.
struct LoadingSink<'c> {
    catalog: &'c mut Catalog,
    next_id: u32,
    seen_header: bool,
    file_is_valid: bool,
}

impl ParserSink for LoadingSink<'_> {
    fn on_entry(&mut self, entry: ParsedEntry) -> ControlFlow<()> {
        self.file_is_valid = true;

        if entry.is_header() {
            if self.seen_header {
                warn!("ignoring duplicate header entry at line {}", entry.line_number);
                return ControlFlow::Continue(());
            }
            self.seen_header = true;

            let header = &mut self.catalog.header;
            header.from_string(entry.translations.first().map(String::as_str).unwrap_or_default());
            header.comment = entry.comment;
            for extracted in &entry.extracted_comments {
                push_comment_line(&mut header.comment, &format!("#. {}", extracted));
            }
            for reference in &entry.references {
                push_comment_line(&mut header.comment, &format!("#: {}", reference));
            }
            if !entry.flags.is_empty() {
                push_comment_line(&mut header.comment, &format!("#{}", entry.flags));
            }
            return ControlFlow::Continue(());
        }

        let mut item = CatalogItem::from_parsed(self.next_id, entry);
        self.next_id += 1;
        item.extracted_comments
            .retain(|c| !(c.starts_with(MSGCAT_CONFLICT_MARKER) && c.ends_with(MSGCAT_CONFLICT_MARKER)));
        if item.has_plural() {
            self.catalog.has_plural_items = true;
        }
        self.catalog.items.push(item);
        ControlFlow::Continue(())
    }

    fn on_deleted_entry(&mut self, entry: ParsedDeletedEntry) -> ControlFlow<()> {
        self.file_is_valid = true;
        self.catalog.deleted_items.push(DeletedItem::from(entry));
        ControlFlow::Continue(())
    }

    fn on_ignored_entry(&mut self) {
        self.file_is_valid = true;
    }
}

impl Catalog {
    /// Loads a PO or POT file; `.pot` files (or `ignore_translations`) give a template.
    pub fn load(path: impl AsRef<Path>, flags: LoadFlags) -> Result<Catalog, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_type = if flags.ignore_translations {
            FileType::Pot
        } else {
            FileType::from_path(path)
        };

        let mut catalog = Self::from_bytes(&bytes, file_type, flags).map_err(|e| {
            error!("couldn't load file {}: {}", path.display(), e);
            e
        })?;
        catalog.file_name = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Loads a catalog from an in-memory PO/POT file.
    pub fn from_bytes(bytes: &[u8], file_type: FileType, flags: LoadFlags) -> Result<Catalog, Error> {
        let raw = TextFile::decode_raw(bytes);
        if raw.is_empty() {
            return Err(Error::InvalidCatalog("the file is empty".to_string()));
        }

        let mut catalog = Catalog {
            file_type,
            ..Default::default()
        };
        catalog.header.charset = sniff_charset(&raw);

        let decoded = match TextFile::decode(bytes, &catalog.header.charset) {
            Ok(decoded) => {
                catalog.charset_issues = verify_charset(&decoded, &raw);
                decoded
            }
            Err(e) => {
                warn!("{}; reading the file as UTF-8", e);
                catalog.charset_issues.push(CharsetIssue::UnknownCharset {
                    charset: catalog.header.charset.clone(),
                });
                let decoded = TextFile::decode(bytes, DEFAULT_CHARSET)?;
                catalog.charset_issues.extend(verify_charset(&decoded, &raw));
                decoded
            }
        };
        for issue in &catalog.charset_issues {
            warn!("charset problem: {}", issue);
        }
        if !catalog.charset_issues.is_empty() {
            error!("there were errors when loading the catalog, some data may be missing or corrupted");
        }
        if decoded.is_empty() {
            return Err(Error::InvalidCatalog("no usable lines".to_string()));
        }

        let options = ParserOptions {
            ignore_header: flags.ignore_header,
            ignore_translations: flags.ignore_translations,
        };
        let mut parser = PoParser::new(decoded.lines(), options);
        let mut sink = LoadingSink {
            catalog: &mut catalog,
            next_id: 1,
            seen_header: false,
            file_is_valid: false,
        };
        parser.parse(&mut sink)?;
        if !sink.file_is_valid {
            return Err(Error::InvalidCatalog("no entries found".to_string()));
        }

        if flags.ignore_header {
            catalog.create_new_header();
        }

        let source = match catalog.header.get_header("X-Source-Language") {
            "" => catalog.header.get_header("X-Loco-Source-Locale"),
            code => code,
        };
        catalog.source_language = Language::try_parse(source);
        catalog.line_ending = decoded.guess_line_ending();
        catalog.wrap_width = parser.wrapping_width();

        catalog.fixup_common_issues();

        let plural_count = catalog.plural_forms_count();
        for item in &mut catalog.items {
            item.pad_translations(plural_count);
        }

        Ok(catalog)
    }

    /// Repairs known problems of files produced by other tools.
    fn fixup_common_issues(&mut self) {
        if self.header.project == "PACKAGE VERSION" {
            self.header.project.clear();
        }

        // "100% sure" is not a format string, but xgettext thinks so
        for item in &mut self.items {
            if item.format_flag() == Some("php") && item.string.contains("% ") && !item.string.contains("%% ") {
                item.replace_flag("php-format", "no-php-format");
            }
        }

        // the rest only makes sense for translations
        if self.is_pot() {
            return;
        }

        if self.header.get_header("Language-Team") == "LANGUAGE <LL@li.org>" {
            self.header.delete_header("Language-Team");
            self.header.language_team.clear();
        }

        if self.header.get_header("Last-Translator") == "FULL NAME <EMAIL@ADDRESS>" {
            self.header.delete_header("Last-Translator");
            self.header.translator.clear();
            self.header.translator_email.clear();
        }

        let mut plural_forms = self.header.get_header("Plural-Forms").to_string();
        if plural_forms == super::PLURAL_FORMS_PLACEHOLDER {
            plural_forms.clear();
        }

        if !plural_forms.is_empty() {
            if !plural_forms.ends_with(';') {
                plural_forms.push(';');
                self.header.set_header("Plural-Forms", plural_forms);
            }
        } else if self.has_plural_items {
            let default = self
                .header
                .language
                .as_ref()
                .and_then(Language::default_plural_forms_expr);
            if let Some(expr) = default {
                self.header.set_header("Plural-Forms", expr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reader::WrapWidth, text_file::LineEnding};

    const SAMPLE: &str = r#"# French translation.
msgid ""
msgstr ""
"Project-Id-Version: PACKAGE VERSION\n"
"Last-Translator: FULL NAME <EMAIL@ADDRESS>\n"
"Language-Team: LANGUAGE <LL@li.org>\n"
"Language: fr\n"
"Content-Type: text/plain; charset=UTF-8\n"
"X-Source-Language: de\n"

#. #-#-#-#-#  a.po  #-#-#-#-#
#. Greeting
msgid "Hello"
msgstr "Bonjour"

#, php-format
msgid "100% sure"
msgstr ""

msgid "%d file"
msgid_plural "%d files"
msgstr[0] "%d fichier"
"#;

    fn load(text: &str) -> Catalog {
        Catalog::from_bytes(text.as_bytes(), FileType::Po, LoadFlags::default()).unwrap()
    }

    #[test]
    fn test_load_sample() {
        let catalog = load(SAMPLE);
        assert_eq!(catalog.items().len(), 3);
        assert_eq!(catalog.header().comment, "# French translation.\n");
        assert_eq!(catalog.source_language().map(Language::code), Some("de"));
        assert_eq!(catalog.line_ending(), LineEnding::Unix);
        assert_eq!(catalog.wrap_width(), WrapWidth::NoWrap);
        assert!(catalog.charset_issues().is_empty());

        let hello = &catalog.items()[0];
        assert_eq!(hello.id, 1);
        assert_eq!(hello.extracted_comments, vec!["Greeting"]);
    }

    #[test]
    fn test_fixups() {
        let catalog = load(SAMPLE);
        let header = catalog.header();
        assert_eq!(header.project, "");
        assert!(!header.has_header("Last-Translator"));
        assert!(!header.has_header("Language-Team"));
        // filled in from the language because there are plural items
        assert_eq!(header.get_header("Plural-Forms"), "nplurals=2; plural=(n > 1);");
        assert_eq!(catalog.items()[1].flags(), ", no-php-format");
        assert_eq!(catalog.items()[2].translations, vec!["%d fichier", ""]);
    }

    #[test]
    fn test_pot_keeps_placeholders() {
        let catalog = Catalog::from_bytes(SAMPLE.as_bytes(), FileType::Pot, LoadFlags::default()).unwrap();
        assert_eq!(catalog.header().get_header("Last-Translator"), "FULL NAME <EMAIL@ADDRESS>");
    }

    #[test]
    fn test_duplicate_header_ignored() {
        let text = "msgid \"\"\nmsgstr \"Language: fr\\n\"\n\nmsgid \"\"\nmsgstr \"Language: de\\n\"\n\nmsgid \"a\"\nmsgstr \"b\"\n";
        let catalog = load(text);
        assert_eq!(catalog.items().len(), 1);
        assert_eq!(catalog.language().map(Language::code), Some("fr"));
    }

    #[test]
    fn test_header_comment_absorbs_metadata() {
        let text = "# Title\n#. extracted\n#: ref.c:1\n#, fuzzy\nmsgid \"\"\nmsgstr \"Language: fr\\n\"\n";
        let catalog = load(text);
        assert_eq!(catalog.header().comment, "# Title\n#. extracted\n#: ref.c:1\n#, fuzzy\n");
    }

    #[test]
    fn test_sniffs_latin1() {
        let bytes = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\nmsgid \"caf\xE9\"\nmsgstr \"\"\n";
        let catalog = Catalog::from_bytes(bytes, FileType::Po, LoadFlags::default()).unwrap();
        assert_eq!(catalog.items()[0].string, "café");
        assert_eq!(catalog.header().charset, "ISO-8859-1");
    }

    #[test]
    fn test_charset_placeholder_means_latin1() {
        let mut raw_lines = Vec::new();
        raw_lines.push("msgid \"\"".to_string());
        raw_lines.push("msgstr \"Content-Type: text/plain; charset=CHARSET\\n\"".to_string());
        assert_eq!(sniff_charset(&TextFile::from_lines(raw_lines)), "ISO-8859-1");
    }

    #[test]
    fn test_misdeclared_utf8_is_reported() {
        let bytes = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n\nmsgid \"a\"\nmsgstr \"caf\xE9\"\n";
        let catalog = Catalog::from_bytes(bytes, FileType::Po, LoadFlags::default()).unwrap();
        assert_eq!(catalog.charset_issues(), &[CharsetIssue::CorruptedLine { line: 5 }]);
    }

    #[test]
    fn test_empty_and_garbage_files_fail() {
        assert!(matches!(
            Catalog::from_bytes(b"", FileType::Po, LoadFlags::default()),
            Err(Error::InvalidCatalog(_))
        ));
        assert!(matches!(
            Catalog::from_bytes(b"just some text\nnothing else\n", FileType::Po, LoadFlags::default()),
            Err(Error::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_ignore_flags() {
        let flags = LoadFlags::new().with_ignore_header(true).with_ignore_translations(true);
        let catalog = Catalog::from_bytes(SAMPLE.as_bytes(), FileType::Pot, flags).unwrap();
        assert!(catalog.items().iter().all(|i| !i.is_translated()));
        assert!(!catalog.header().has_header("Language"));
        assert!(catalog.header().has_header("X-Generator"));
    }

    #[test]
    fn test_load_from_disk_sets_file_type() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("messages.pot");
        fs::write(&path, SAMPLE).unwrap();
        let catalog = Catalog::load(&path, LoadFlags::default()).unwrap();
        assert!(catalog.is_pot());
        assert_eq!(catalog.file_name(), Some(path.as_path()));
    }
}
