//! Writing catalogs: serialization, validation, msgcat formatting and MO compilation.

use std::{
    ffi::{OsStr, OsString},
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::{
    catalog::{Catalog, FileType, current_time_string},
    config::CatalogConfig,
    error::Error,
    escape::{escape_c_string, format_string_for_file, push_multi_lines},
    header::DEFAULT_CHARSET,
    item::Issue,
    reader::WrapWidth,
    text_file::{LineEnding, can_encode, convert_line_endings, encode_lines},
    tool::{GettextErrorLevel, GettextRunner, ToolOutput},
};

/// Counts of problems `msgfmt -c` attached to items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResults {
    pub errors: usize,
    pub warnings: usize,
}

/// Outcome of compiling the MO file during save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationStatus {
    #[default]
    NotDone,
    Success,
    Error,
}

/// Something the user should know about a save that still succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SaveNotice {
    /// The declared charset couldn't represent the text; UTF-8 was used.
    CharsetUpgraded { from: String },
    /// `msgcat` failed, the file was saved without reformatting.
    FormattingFailed { message: String },
    CompilationFailed { message: String },
}

impl fmt::Display for SaveNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveNotice::CharsetUpgraded { from } => write!(
                f,
                "the file couldn't be saved in \"{}\" charset, it was saved in UTF-8 instead",
                from
            ),
            SaveNotice::FormattingFailed { message } => {
                write!(f, "the file was saved without formatting: {}", message)
            }
            SaveNotice::CompilationFailed { message } => {
                write!(f, "the MO file couldn't be compiled: {}", message)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveResult {
    pub validation: ValidationResults,
    pub mo_status: CompilationStatus,
    pub notices: Vec<SaveNotice>,
}

fn push_keyword(lines: &mut Vec<String>, keyword: &str, text: &str) {
    let formatted = format!("{} \"{}\"", keyword, format_string_for_file(text));
    push_multi_lines(lines, &formatted);
}

/// Compiles `po` into `mo` with `msgfmt`.
///
/// `msgfmt` exits with an error for some recoverable problems while still
/// writing a usable file, so an existing output counts as success.
fn compile_with_msgfmt(runner: &GettextRunner, po: &Path, mo: &Path) -> Result<(), Error> {
    let dir = parent_dir(mo);
    let compiled = save_file_builder(".mo").tempfile_in(&dir)?;
    let output = runner.run(
        "msgfmt",
        [OsStr::new("-o"), compiled.path().as_os_str(), po.as_os_str()],
    )?;

    if fs::metadata(compiled.path()).is_ok_and(|m| m.len() > 0) {
        if !output.success {
            debug!("msgfmt reported problems but produced {}", mo.display());
        }
        compiled.persist(mo).map_err(|e| Error::Io(e.error))?;
        return Ok(());
    }

    output.into_result()?;
    Err(Error::tool_error("msgfmt", "no output file was created"))
}

/// Temp files that may become the saved file get the usual `0o666 & !umask`
/// mode instead of tempfile's owner-only default.
fn save_file_builder(suffix: &'static str) -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".pocatalog").suffix(suffix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl Catalog {
    fn serialize_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        push_multi_lines(&mut lines, &self.header.comment);
        if self.is_pot() && !self.header.comment.lines().any(|l| l.starts_with("#,")) {
            lines.push("#, fuzzy".to_string());
        }
        lines.push("msgid \"\"".to_string());
        lines.push("msgstr \"\"".to_string());
        for (key, value) in self.header.entries() {
            lines.push(format!("\"{}: {}\\n\"", escape_c_string(key), escape_c_string(value)));
        }
        lines.push(String::new());

        let plural_count = self.plural_forms_count();
        let is_pot = self.is_pot();

        for item in &mut self.items {
            item.line_number = lines.len() + 1;

            push_multi_lines(&mut lines, &item.comment);
            for extracted in &item.extracted_comments {
                if extracted.is_empty() {
                    lines.push("#.".to_string());
                } else {
                    lines.push(format!("#. {}", extracted));
                }
            }
            for reference in &item.references {
                lines.push(format!("#: {}", reference));
            }
            let flags = item.flags();
            if !flags.is_empty() {
                lines.push(format!("#{}", flags));
            }
            for old in &item.msgid_old {
                lines.push(format!("#| {}", old));
            }
            if let Some(context) = &item.context {
                push_keyword(&mut lines, "msgctxt", context);
            }
            push_keyword(&mut lines, "msgid", &item.string);

            match &item.plural {
                Some(plural) => {
                    push_keyword(&mut lines, "msgid_plural", plural);
                    for i in 0..plural_count {
                        let translation = item.translations.get(i).map(String::as_str).unwrap_or_default();
                        push_keyword(&mut lines, &format!("msgstr[{}]", i), translation);
                    }
                }
                None if is_pot => lines.push("msgstr \"\"".to_string()),
                None => push_keyword(&mut lines, "msgstr", item.translation()),
            }
            lines.push(String::new());
        }

        for (index, deleted) in self.deleted_items.iter_mut().enumerate() {
            if index != 0 {
                lines.push(String::new());
            }
            push_multi_lines(&mut lines, &deleted.comment);
            for extracted in &deleted.extracted_comments {
                lines.push(format!("#. {}", extracted));
            }
            for reference in &deleted.references {
                lines.push(format!("#: {}", reference));
            }
            if !deleted.flags.is_empty() {
                lines.push(format!("#{}", deleted.flags));
            }
            deleted.line_number = lines.len() + 1;
            lines.extend(deleted.lines.iter().cloned());
        }

        lines
    }

    /// Serializes the catalog into lines, without line terminators.
    ///
    /// Item line numbers are updated to their positions in the output. If
    /// the header's charset can't represent the text, the charset is changed
    /// to UTF-8 and a notice is recorded.
    pub fn save_lines(&mut self, notices: &mut Vec<SaveNotice>) -> Vec<String> {
        loop {
            self.header.charset = self.header.effective_charset().to_string();
            self.header.update_dict();

            let lines = self.serialize_lines();
            if can_encode(&lines, &self.header.charset) {
                return lines;
            }

            warn!(
                "the file couldn't be saved in {} charset, switching to UTF-8",
                self.header.charset
            );
            notices.push(SaveNotice::CharsetUpgraded {
                from: std::mem::replace(&mut self.header.charset, DEFAULT_CHARSET.to_string()),
            });
        }
    }

    /// Serializes the catalog into bytes with Unix line endings.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, Error> {
        let mut notices = Vec::new();
        let lines = self.save_lines(&mut notices);
        encode_lines(&lines, LineEnding::Unix, &self.header.charset)
    }

    /// Writes the catalog to `path` as is, without any post-processing.
    pub(crate) fn do_save_only(&mut self, path: &Path, ending: LineEnding) -> Result<Vec<SaveNotice>, Error> {
        let mut notices = Vec::new();
        let lines = self.save_lines(&mut notices);
        let bytes = encode_lines(&lines, ending, &self.header.charset)?;
        fs::write(path, bytes)?;
        Ok(notices)
    }

    /// Line endings to write: the file's own when keeping format, else configured.
    pub fn desired_line_ending(&self, config: &CatalogConfig) -> LineEnding {
        if config.keep_format && self.line_ending != LineEnding::None {
            self.line_ending
        } else {
            config.line_ending
        }
    }

    fn msgcat_wrap_args(&self, config: &CatalogConfig) -> Vec<OsString> {
        let width = match (config.keep_format, self.wrap_width) {
            (true, WrapWidth::NoWrap) => None,
            (true, WrapWidth::Width(width)) => Some(width),
            _ => config.wrap.then_some(config.wrap_width),
        };
        match width {
            None => vec!["--no-wrap".into()],
            Some(width) => vec![format!("--width={}", width).into()],
        }
    }

    /// Saves the catalog to `path`, optionally compiling the MO file next to it.
    ///
    /// The text is validated with `msgfmt -c`, normalized by `msgcat` and
    /// atomically moved into place. A `msgcat` failure doesn't fail the save;
    /// the unformatted file is kept and a notice recorded.
    pub fn save(
        &mut self,
        path: impl AsRef<Path>,
        save_mo: bool,
        config: &CatalogConfig,
    ) -> Result<SaveResult, Error> {
        let path = path.as_ref();
        let existing = fs::metadata(path).ok();
        if existing.as_ref().is_some_and(|m| m.permissions().readonly()) {
            return Err(Error::ReadOnly(path.to_path_buf()));
        }

        // an empty date means the author doesn't want it maintained
        let now = current_time_string();
        match self.file_type {
            FileType::Po if !self.header.revision_date.is_empty() => self.header.revision_date = now,
            FileType::Pot if !self.header.creation_date.is_empty() => self.header.creation_date = now,
            _ => {}
        }
        if self.file_type == FileType::Po {
            if let Some(name) = &config.translator_name {
                self.header.translator = name.clone();
                self.header.translator_email = config.translator_email.clone().unwrap_or_default();
            }
        }

        let ending = self.desired_line_ending(config);
        let dir = parent_dir(path);
        let runner = GettextRunner::from_config(config);
        let mut result = SaveResult::default();

        let lines = self.save_lines(&mut result.notices);
        let bytes = encode_lines(&lines, LineEnding::Unix, &self.header.charset)?;
        let mut unformatted = save_file_builder(".po").tempfile_in(&dir)?;
        unformatted.write_all(&bytes)?;
        unformatted.flush()?;

        result.validation = match self.validate(Some(unformatted.path()), config) {
            Ok(validation) => validation,
            Err(e) => {
                warn!("validation skipped: {}", e);
                ValidationResults::default()
            }
        };

        let formatted = save_file_builder(".po").tempfile_in(&dir)?;
        let mut args: Vec<OsString> = vec!["--force-po".into()];
        args.extend(self.msgcat_wrap_args(config));
        args.push("-o".into());
        args.push(formatted.path().into());
        args.push(unformatted.path().into());

        let msgcat = runner.run("msgcat", &args).and_then(ToolOutput::into_result);
        let final_file = match msgcat {
            Ok(_) if fs::metadata(formatted.path()).is_ok_and(|m| m.len() > 0) => formatted,
            outcome => {
                let message = match outcome {
                    Err(e) => e.to_string(),
                    Ok(_) => "msgcat produced no output".to_string(),
                };
                warn!("saving unformatted file: {}", message);
                // validation errors already explain why msgcat choked
                if result.validation.errors == 0 {
                    result.notices.push(SaveNotice::FormattingFailed { message });
                }
                unformatted
            }
        };

        if ending == LineEnding::Dos {
            let content = fs::read(final_file.path())?;
            fs::write(final_file.path(), convert_line_endings(&content, LineEnding::Dos))?;
        }
        if let Some(meta) = &existing {
            fs::set_permissions(final_file.path(), meta.permissions())?;
        }
        final_file.persist(path).map_err(|e| Error::Io(e.error))?;
        info!("saved {}", path.display());

        self.file_name = Some(path.to_path_buf());
        if ending != LineEnding::None {
            self.line_ending = ending;
        }

        if save_mo && self.file_type == FileType::Po {
            let mo_path = path.with_extension("mo");
            result.mo_status = match compile_with_msgfmt(&runner, path, &mo_path) {
                Ok(()) => CompilationStatus::Success,
                Err(e) => {
                    warn!("couldn't compile {}: {}", mo_path.display(), e);
                    result.notices.push(SaveNotice::CompilationFailed {
                        message: e.to_string(),
                    });
                    CompilationStatus::Error
                }
            };
        }

        Ok(result)
    }

    /// Compiles the catalog into an MO file at `mo_path`.
    pub fn compile_to_mo(&mut self, mo_path: impl AsRef<Path>, config: &CatalogConfig) -> Result<(), Error> {
        let tmp = TempDir::new()?;
        let po = tmp.path().join("compiled.po");
        self.do_save_only(&po, LineEnding::Unix)?;
        compile_with_msgfmt(&GettextRunner::from_config(config), &po, mo_path.as_ref())
    }

    /// Checks the catalog with `msgfmt -c` and attaches problems to items.
    ///
    /// `file_with_same_content` may name an up-to-date copy on disk, saving
    /// a temporary file. Templates are never checked.
    pub fn validate(
        &mut self,
        file_with_same_content: Option<&Path>,
        config: &CatalogConfig,
    ) -> Result<ValidationResults, Error> {
        self.clear_issues();
        if self.is_pot() {
            return Ok(ValidationResults::default());
        }

        let runner = GettextRunner::from_config(config);
        match file_with_same_content {
            Some(file) => self.validate_with_msgfmt(&runner, file),
            None => {
                let tmp = TempDir::new()?;
                let po = tmp.path().join("validated.po");
                // diagnostics refer to the snapshot's line numbers
                let mut snapshot = self.clone();
                snapshot.do_save_only(&po, LineEnding::Unix)?;
                let results = snapshot.validate_with_msgfmt(&runner, &po)?;
                for (item, checked) in self.items.iter_mut().zip(snapshot.items) {
                    item.issue = checked.issue;
                }
                Ok(results)
            }
        }
    }

    fn validate_with_msgfmt(&mut self, runner: &GettextRunner, po: &Path) -> Result<ValidationResults, Error> {
        let out_dir = TempDir::new()?;
        let mo = out_dir.path().join("validated.mo");
        let output = runner.run(
            "msgfmt",
            [OsStr::new("-o"), mo.as_os_str(), OsStr::new("-c"), po.as_os_str()],
        )?;

        let mut results = ValidationResults::default();
        for diagnostic in runner.parse_stderr(&output).items {
            // msgfmt also prints summaries like "2 fatal errors" without a location
            let Some(line) = diagnostic.line else {
                continue;
            };
            let Some(item) = self.find_item_by_line_mut(line) else {
                continue;
            };
            match diagnostic.level {
                GettextErrorLevel::Error => {
                    results.errors += 1;
                    item.set_issue(Issue::error(diagnostic.text));
                }
                GettextErrorLevel::Warning => {
                    results.warnings += 1;
                    item.set_issue(Issue::warning(diagnostic.text));
                }
            }
        }
        Ok(results)
    }
}
