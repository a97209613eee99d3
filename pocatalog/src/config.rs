//! Settings passed explicitly to load, save and merge operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{error::Error, text_file::LineEnding};

/// How `msgmerge` should treat strings that have no exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeBehavior {
    /// Let `msgmerge` guess fuzzy translations.
    #[default]
    FuzzyMatch,
    /// Fuzzy matching, then pre-translation from translation memory.
    UseTm,
    /// No fuzzy matching at all.
    None,
}

/// Catalog-wide preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Keep the existing file's line endings and wrapping.
    pub keep_format: bool,
    /// Line endings for new files, or for all files without `keep_format`.
    pub line_ending: LineEnding,
    pub wrap: bool,
    pub wrap_width: usize,
    pub merge_behavior: MergeBehavior,
    /// Compile an MO file next to the PO file on save.
    pub compile_mo: bool,
    pub use_tm: bool,
    pub translator_name: Option<String>,
    pub translator_email: Option<String>,
    /// Directory containing the gettext binaries; `PATH` is used when unset.
    pub gettext_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            keep_format: true,
            line_ending: LineEnding::Unix,
            wrap: true,
            wrap_width: 79,
            merge_behavior: MergeBehavior::FuzzyMatch,
            compile_mo: true,
            use_tm: true,
            translator_name: None,
            translator_email: None,
            gettext_path: None,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keep_format(mut self, keep_format: bool) -> Self {
        self.keep_format = keep_format;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets the wrap width; `None` disables wrapping.
    pub fn with_wrap_width(mut self, wrap_width: Option<usize>) -> Self {
        match wrap_width {
            Some(width) => {
                self.wrap = true;
                self.wrap_width = width;
            }
            None => self.wrap = false,
        }
        self
    }

    pub fn with_merge_behavior(mut self, merge_behavior: MergeBehavior) -> Self {
        self.merge_behavior = merge_behavior;
        self
    }

    pub fn with_compile_mo(mut self, compile_mo: bool) -> Self {
        self.compile_mo = compile_mo;
        self
    }

    pub fn with_translator(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.translator_name = name;
        self.translator_email = email;
        self
    }

    pub fn with_gettext_path(mut self, gettext_path: Option<PathBuf>) -> Self {
        self.gettext_path = gettext_path;
        self
    }

    /// Rejects settings the gettext tools can't honor.
    pub fn check(&self) -> Result<(), Error> {
        if self.wrap && self.wrap_width < 2 {
            return Err(Error::Config(format!(
                "wrap_width must be at least 2, got {}",
                self.wrap_width
            )));
        }
        Ok(())
    }

    /// Whether `msgmerge` may produce fuzzy matches.
    pub fn fuzzy_matching(&self) -> bool {
        self.merge_behavior != MergeBehavior::None
    }
}

/// Options for [`crate::Catalog::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadFlags {
    /// Replace the file's header with a fresh one.
    pub ignore_header: bool,
    /// Drop all translations; the result is a template.
    pub ignore_translations: bool,
}

impl LoadFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_header(mut self, ignore_header: bool) -> Self {
        self.ignore_header = ignore_header;
        self
    }

    pub fn with_ignore_translations(mut self, ignore_translations: bool) -> Self {
        self.ignore_translations = ignore_translations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert!(config.keep_format);
        assert!(config.wrap);
        assert_eq!(config.wrap_width, 79);
        assert!(config.fuzzy_matching());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: CatalogConfig =
            serde_json::from_str(r#"{"line_ending": "dos", "merge_behavior": "none"}"#).unwrap();
        assert_eq!(config.line_ending, LineEnding::Dos);
        assert_eq!(config.merge_behavior, MergeBehavior::None);
        assert!(!config.fuzzy_matching());
        assert_eq!(config.wrap_width, 79);
    }

    #[test]
    fn test_builder() {
        let config = CatalogConfig::new()
            .with_wrap_width(None)
            .with_merge_behavior(MergeBehavior::UseTm)
            .with_keep_format(false);
        assert!(!config.wrap);
        assert!(!config.keep_format);
        assert!(config.fuzzy_matching());
    }

    #[test]
    fn test_check_rejects_tiny_wrap_width() {
        assert!(CatalogConfig::default().check().is_ok());
        let config = CatalogConfig::default().with_wrap_width(Some(0));
        assert!(matches!(config.check(), Err(Error::Config(_))));
        assert!(CatalogConfig::default().with_wrap_width(None).check().is_ok());
    }
}
