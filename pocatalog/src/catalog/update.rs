//! Merging with templates through `msgmerge` and deduplicating through `msguniq`.

use std::{ffi::OsString, path::Path};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, FileType},
    config::{CatalogConfig, LoadFlags},
    error::Error,
    text_file::LineEnding,
    tool::{GettextRunner, ParsedGettextErrors},
};

impl Catalog {
    /// Merges the catalog with `reference` (usually a template) using `msgmerge`.
    ///
    /// Returns the diagnostics `msgmerge` printed. The merged catalog keeps this
    /// catalog's file name, charset, line endings and wrapping.
    pub fn merge(&mut self, reference: &Catalog, config: &CatalogConfig) -> Result<ParsedGettextErrors, Error> {
        let tmp = TempDir::new()?;
        let ref_path = tmp.path().join("ref.pot");
        let input_path = tmp.path().join("input.po");
        let output_path = tmp.path().join("output.po");

        // saving updates line numbers and may fix the charset, so work on copies
        reference.clone().do_save_only(&ref_path, LineEnding::Unix)?;
        self.clone().do_save_only(&input_path, LineEnding::Unix)?;

        let mut args: Vec<OsString> = vec!["-q".into(), "--force-po".into(), "--previous".into()];
        if !config.fuzzy_matching() {
            args.push("--no-fuzzy-matching".into());
        }
        args.push("-o".into());
        args.push(output_path.clone().into());
        args.push(input_path.into());
        args.push(ref_path.into());

        let runner = GettextRunner::from_config(config);
        let output = runner.run("msgmerge", &args)?;
        let errors = runner.parse_stderr(&output);
        errors.log_errors();
        output.into_result()?;

        let mut merged = Catalog::load(&output_path, LoadFlags::default())?;
        merged.file_name = self.file_name.take();
        merged.line_ending = self.line_ending;
        merged.wrap_width = self.wrap_width;
        merged.source_is_symbolic_id = self.source_is_symbolic_id;
        merged.post_creation();
        // msgmerge picks the most generic charset of its inputs
        merged.header.charset = std::mem::take(&mut self.header.charset);

        debug!(
            "merged {} items into {} items",
            self.items.len(),
            merged.items.len()
        );
        *self = merged;
        Ok(errors)
    }

    /// Brings the catalog up to date with a template.
    ///
    /// Translations are merged; templates simply take the template's strings.
    /// With `replace_header`, the header is rebuilt from the template's one.
    pub fn update_from_pot(
        &mut self,
        pot: &Catalog,
        replace_header: bool,
        config: &CatalogConfig,
    ) -> Result<ParsedGettextErrors, Error> {
        let errors = match self.file_type {
            FileType::Po => self.merge(pot, config)?,
            FileType::Pot => {
                self.items = pot.items.clone();
                self.source_language = pot.source_language.clone();
                self.source_is_symbolic_id = pot.source_is_symbolic_id;
                self.has_plural_items = pot.has_plural_items;
                ParsedGettextErrors::default()
            }
        };

        if replace_header {
            self.create_new_header_from(&pot.header);
        }
        Ok(errors)
    }

    /// Loads `pot_file` without translations and updates from it.
    pub fn update_from_pot_file(
        &mut self,
        pot_file: impl AsRef<Path>,
        replace_header: bool,
        config: &CatalogConfig,
    ) -> Result<ParsedGettextErrors, Error> {
        let pot_file = pot_file.as_ref();
        let pot = Catalog::load(pot_file, LoadFlags::new().with_ignore_translations(true)).map_err(|e| {
            Error::InvalidCatalog(format!("\"{}\" is not a valid POT file: {}", pot_file.display(), e))
        })?;
        self.update_from_pot(&pot, replace_header, config)
    }

    /// Starts a new translation from a template.
    pub fn create_from_pot(pot: &Catalog, config: &CatalogConfig) -> Result<Catalog, Error> {
        let mut catalog = Catalog::new(FileType::Po);
        catalog.update_from_pot(pot, true, config)?;
        info!("created translation with {} items", catalog.items.len());
        Ok(catalog)
    }

    /// Removes duplicate (context, source) entries with `msguniq`.
    pub fn fix_duplicate_items(&mut self, config: &CatalogConfig) -> Result<(), Error> {
        let tmp = TempDir::new()?;
        let ext = self.file_type.extension();
        let input_path = tmp.path().join(format!("catalog.{}", ext));
        let fixed_path = tmp.path().join(format!("fixed.{}", ext));

        self.do_save_only(&input_path, LineEnding::Unix)?;

        let runner = GettextRunner::from_config(config);
        let output = runner.run(
            "msguniq",
            [
                OsString::from("-o"),
                fixed_path.clone().into(),
                input_path.into(),
            ],
        )?;
        if !fixed_path.exists() {
            output.into_result()?;
            return Err(Error::tool_error("msguniq", "no output file was created"));
        }

        let flags = LoadFlags::new().with_ignore_translations(self.is_pot());
        let mut fixed = Catalog::load(&fixed_path, flags)?;
        fixed.file_name = self.file_name.take();
        fixed.line_ending = self.line_ending;
        fixed.wrap_width = self.wrap_width;
        fixed.source_is_symbolic_id = self.source_is_symbolic_id;
        fixed.post_creation();
        *self = fixed;
        Ok(())
    }
}
