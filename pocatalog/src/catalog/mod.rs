//! The catalog aggregate: items, obsolete items, header and file metadata.
//!
//! Loading lives in [`load`], serialization and the gettext-assisted save
//! pipeline in [`save`], and msgmerge/msguniq based operations in [`update`].

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    error::Error,
    header::{DEFAULT_CHARSET, HeaderData},
    item::{CatalogItem, DeletedItem},
    language::Language,
    reader::WrapWidth,
    text_file::{CharsetIssue, LineEnding},
};

pub mod load;
pub mod save;
pub mod update;

pub use save::{CompilationStatus, SaveNotice, SaveResult, ValidationResults};

const PLURAL_FORMS_PLACEHOLDER: &str = "nplurals=INTEGER; plural=EXPRESSION;";

/// Whether a catalog holds translations or is a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Po,
    Pot,
}

impl FileType {
    /// `.pot` files are templates, anything else is a translation.
    pub fn from_path(path: &Path) -> FileType {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pot") => FileType::Pot,
            _ => FileType::Po,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Po => "po",
            FileType::Pot => "pot",
        }
    }
}

/// Counts of items by translation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub all: usize,
    pub translated: usize,
    pub fuzzy: usize,
    /// Items with a validation issue.
    pub bad: usize,
    pub untranslated: usize,
}

impl CatalogStats {
    /// Percentage of finished (translated, not fuzzy) items.
    pub fn completion(&self) -> f64 {
        if self.all == 0 {
            return 100.0;
        }
        let done = self.translated.saturating_sub(self.fuzzy);
        done as f64 * 100.0 / self.all as f64
    }
}

/// A PO or POT catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) items: Vec<CatalogItem>,
    pub(crate) deleted_items: Vec<DeletedItem>,
    pub(crate) header: HeaderData,
    pub(crate) file_type: FileType,
    pub(crate) file_name: Option<PathBuf>,
    pub(crate) line_ending: LineEnding,
    pub(crate) wrap_width: WrapWidth,
    pub(crate) source_language: Option<Language>,
    pub(crate) source_is_symbolic_id: bool,
    pub(crate) has_plural_items: bool,
    pub(crate) charset_issues: Vec<CharsetIssue>,
}

/// Current time in the format used by the date header fields.
pub(crate) fn current_time_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M%z").to_string()
}

impl Catalog {
    /// Creates an empty catalog with a fresh header.
    pub fn new(file_type: FileType) -> Self {
        let mut catalog = Catalog {
            file_type,
            line_ending: LineEnding::None,
            ..Default::default()
        };
        catalog.create_new_header();
        catalog
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [CatalogItem] {
        &mut self.items
    }

    pub fn add_item(&mut self, mut item: CatalogItem) {
        item.id = self.items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        if item.has_plural() {
            self.has_plural_items = true;
        }
        self.items.push(item);
    }

    pub fn deleted_items(&self) -> &[DeletedItem] {
        &self.deleted_items
    }

    pub fn remove_deleted_items(&mut self) {
        self.deleted_items.clear();
    }

    pub fn header(&self) -> &HeaderData {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderData {
        &mut self.header
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn is_pot(&self) -> bool {
        self.file_type == FileType::Pot
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, path: impl Into<PathBuf>) {
        self.file_name = Some(path.into());
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn wrap_width(&self) -> WrapWidth {
        self.wrap_width
    }

    pub fn source_language(&self) -> Option<&Language> {
        self.source_language.as_ref()
    }

    pub fn set_source_language(&mut self, language: Option<Language>) {
        self.source_language = language;
    }

    pub fn source_is_symbolic_id(&self) -> bool {
        self.source_is_symbolic_id
    }

    pub fn set_source_is_symbolic_id(&mut self, symbolic: bool) {
        self.source_is_symbolic_id = symbolic;
    }

    /// Target language from the header.
    pub fn language(&self) -> Option<&Language> {
        self.header.language.as_ref()
    }

    /// Sets the target language and updates `Plural-Forms` if it is used.
    pub fn set_language(&mut self, language: Language) {
        if self.has_plural_items || self.header.has_header("Plural-Forms") {
            let expr = language.default_plural_forms_expr().unwrap_or_default();
            self.header.set_header_not_empty("Plural-Forms", expr);
        }
        self.header.language = Some(language);
    }

    pub fn has_plural_items(&self) -> bool {
        self.has_plural_items
    }

    /// Problems found while decoding the file under its declared charset.
    pub fn charset_issues(&self) -> &[CharsetIssue] {
        &self.charset_issues
    }

    /// Plural forms count: the larger of the header's and the items' counts.
    pub fn plural_forms_count(&self) -> usize {
        let items_count = self
            .items
            .iter()
            .map(CatalogItem::plural_forms_count)
            .max()
            .unwrap_or(0);
        self.header.plural_forms_count().max(items_count)
    }

    /// True if some item has more plural translations than the header allows.
    pub fn has_wrong_plural_forms_count(&self) -> bool {
        let count = self
            .items
            .iter()
            .map(CatalogItem::plural_forms_count)
            .max()
            .unwrap_or(0);
        // fewer than the header says may just mean untranslated strings
        count != 0 && count > self.header.plural_forms_count()
    }

    /// The item whose entry starts at or before `line` and is closest to it.
    pub fn find_item_by_line(&self, line: usize) -> Option<&CatalogItem> {
        self.items.iter().take_while(|i| i.line_number <= line).last()
    }

    pub(crate) fn find_item_by_line_mut(&mut self, line: usize) -> Option<&mut CatalogItem> {
        self.items
            .iter_mut()
            .take_while(|i| i.line_number <= line)
            .last()
    }

    /// True if two items share the same context and source string.
    pub fn has_duplicate_items(&self) -> bool {
        let mut seen = HashSet::new();
        self.items.iter().any(|item| !seen.insert(item.key()))
    }

    pub fn clear_issues(&mut self) {
        for item in &mut self.items {
            item.clear_issue();
        }
    }

    pub fn statistics(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            all: self.items.len(),
            ..Default::default()
        };
        for item in &self.items {
            if item.is_fuzzy() {
                stats.fuzzy += 1;
            }
            if item.issue.is_some() {
                stats.bad += 1;
            }
            if item.is_translated() {
                stats.translated += 1;
            } else {
                stats.untranslated += 1;
            }
        }
        stats
    }

    /// Replaces the header with a fresh one.
    pub fn create_new_header(&mut self) {
        let now = current_time_string();
        let comment = std::mem::take(&mut self.header.comment);
        self.header = HeaderData::new();
        self.header.comment = comment;
        self.header.creation_date = now.clone();
        self.header.revision_date = now;
        self.header.charset = DEFAULT_CHARSET.to_string();
        self.header.update_dict();
        if self.is_pot() {
            self.header.set_header("Plural-Forms", PLURAL_FORMS_PLACEHOLDER);
        }
        self.header.set_header("X-Generator", generator());
        if let Some(source) = &self.source_language {
            self.header.set_header("X-Source-Language", source.code());
        }
    }

    /// Replaces the header with one derived from a template's header.
    pub fn create_new_header_from(&mut self, pot_header: &HeaderData) {
        self.header = pot_header.clone();
        // UTF-8 no matter what the template uses
        self.header.charset = DEFAULT_CHARSET.to_string();
        self.header.language = None;

        if self.header.language_team == "LANGUAGE <LL@li.org>" {
            self.header.language_team.clear();
        }
        self.header.delete_header("Last-Translator");
        self.header.translator.clear();
        self.header.translator_email.clear();
        if self.header.get_header("Plural-Forms") == PLURAL_FORMS_PLACEHOLDER {
            self.header.delete_header("Plural-Forms");
        }

        self.header.update_dict();
        self.header.set_header("X-Generator", generator());
    }

    /// Structured view of the catalog, for tooling and debugging.
    pub fn to_json_value(&self) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "line": item.line_number,
                    "context": item.context,
                    "msgid": item.string,
                    "msgid_plural": item.plural,
                    "msgstr": item.translations,
                    "fuzzy": item.is_fuzzy(),
                    "flags": item.flags(),
                    "comment": item.comment,
                    "extracted_comments": item.extracted_comments,
                    "references": item.parsed_references(),
                    "issue": item.issue,
                })
            })
            .collect();
        let deleted: Vec<Value> = self
            .deleted_items
            .iter()
            .map(|item| json!({ "line": item.line_number, "lines": item.lines }))
            .collect();
        json!({
            "file": self.file_name.as_ref().map(|p| p.display().to_string()),
            "type": self.file_type,
            "language": self.language().map(|l| l.code()),
            "source_language": self.source_language.as_ref().map(|l| l.code()),
            "charset": self.header.charset,
            "line_ending": self.line_ending,
            "plural_forms": self.plural_forms_count(),
            "header": self.header.entries().iter().cloned().collect::<Vec<_>>(),
            "statistics": self.statistics(),
            "items": items,
            "obsolete": deleted,
        })
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }

    /// Finishes a freshly created or reloaded catalog.
    pub fn post_creation(&mut self) {
        if self.source_language.is_none() && !self.source_is_symbolic_id {
            self.source_language = Some(Language::english());
        }
    }
}

fn generator() -> String {
    format!("pocatalog {}", env!("CARGO_PKG_VERSION"))
}
