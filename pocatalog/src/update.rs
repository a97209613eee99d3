//! Updating translations from a reference file or from source code.
//!
//! Every workflow works on an immutable catalog and returns an
//! [`UpdateOutcome`] holding the updated copy, so the caller decides
//! whether to apply it.

use std::{
    collections::HashSet,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use ignore::WalkBuilder;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::Catalog,
    config::{CatalogConfig, LoadFlags, MergeBehavior},
    error::{Error, ExtractionError},
    header::HeaderData,
    item::CatalogItem,
    pretranslate::{PreTranslateOptions, TranslationMemory, pretranslate},
    task::{CancellationToken, NoProgress, Progress},
    tool::{GettextRunner, ParsedGettextErrors},
};

/// Where the source code of a translation lives, read from its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCodeSpec {
    pub base_path: PathBuf,
    pub search_paths: Vec<PathBuf>,
    pub excluded_paths: Vec<PathBuf>,
    pub keywords: Vec<String>,
    /// Charset of the source files, if declared.
    pub charset: Option<String>,
}

fn numbered_headers(header: &HeaderData, prefix: &str) -> Vec<String> {
    (0..)
        .map(|i| header.get_header(&format!("{}{}", prefix, i)))
        .take_while(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

impl SourceCodeSpec {
    /// Reads the `X-Poedit-*` source settings; `None` if no search path is set.
    ///
    /// The base path is relative to the catalog's directory.
    pub fn from_catalog(catalog: &Catalog) -> Option<SourceCodeSpec> {
        let header = catalog.header();
        let search_paths: Vec<PathBuf> = numbered_headers(header, "X-Poedit-SearchPath-")
            .into_iter()
            .map(PathBuf::from)
            .collect();
        if search_paths.is_empty() {
            return None;
        }

        let catalog_dir = catalog
            .file_name()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let base_path = match header.get_header("X-Poedit-Basepath") {
            "" => catalog_dir.to_path_buf(),
            base => catalog_dir.join(base),
        };

        let keywords = header
            .get_header("X-Poedit-KeywordsList")
            .split(';')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        let charset = match header.get_header("X-Poedit-SourceCharset") {
            "" => None,
            charset => Some(charset.to_string()),
        };

        Some(SourceCodeSpec {
            base_path,
            search_paths,
            excluded_paths: numbered_headers(header, "X-Poedit-SearchPathExcluded-")
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            keywords,
            charset,
        })
    }

    /// All files under the search paths, minus excluded ones, sorted.
    ///
    /// Hidden files and anything matched by `.gitignore` are skipped.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, Error> {
        let excluded: Vec<PathBuf> = self.excluded_paths.iter().map(|p| self.base_path.join(p)).collect();
        let mut files = Vec::new();

        for search in &self.search_paths {
            let root = self.base_path.join(search);
            if let Err(e) = fs::metadata(&root) {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    return Err(Error::extraction_error(ExtractionError::PermissionDenied, Some(root)));
                }
                debug!("search path {} doesn't exist", root.display());
                continue;
            }

            for entry in WalkBuilder::new(&root).hidden(true).git_ignore(true).build() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        if e.io_error().is_some_and(|io| io.kind() == io::ErrorKind::PermissionDenied) {
                            return Err(Error::extraction_error(ExtractionError::PermissionDenied, Some(root)));
                        }
                        warn!("skipping unreadable source: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if excluded.iter().any(|ex| entry.path().starts_with(ex)) {
                    continue;
                }
                files.push(entry.into_path());
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Result of running an [`Extractor`].
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub pot_file: PathBuf,
    /// Problems found in the source strings.
    pub errors: ParsedGettextErrors,
}

/// Extracts translatable strings from source files into a POT file.
pub trait Extractor: Sync {
    fn name(&self) -> &str;

    /// Writes the POT file into `output_dir`.
    fn extract(&self, spec: &SourceCodeSpec, files: &[PathBuf], output_dir: &Path) -> Result<ExtractionOutput, Error>;
}

/// Extraction with GNU `xgettext`.
#[derive(Debug, Clone, Default)]
pub struct XgettextExtractor {
    runner: GettextRunner,
}

impl XgettextExtractor {
    pub fn new(config: &CatalogConfig) -> Self {
        XgettextExtractor {
            runner: GettextRunner::from_config(config),
        }
    }
}

impl Extractor for XgettextExtractor {
    fn name(&self) -> &str {
        "xgettext"
    }

    fn extract(&self, spec: &SourceCodeSpec, files: &[PathBuf], output_dir: &Path) -> Result<ExtractionOutput, Error> {
        let list_file = output_dir.join("files.list");
        let pot_file = output_dir.join("extracted.pot");

        let list: Vec<String> = files.iter().map(|f| f.to_string_lossy().into_owned()).collect();
        fs::write(&list_file, list.join("\n"))?;

        let mut args: Vec<OsString> = vec![
            "--force-po".into(),
            "--add-comments=TRANSLATORS:".into(),
            format!("--from-code={}", spec.charset.as_deref().unwrap_or("UTF-8")).into(),
        ];
        for keyword in &spec.keywords {
            args.push(format!("-k{}", keyword).into());
        }
        args.push("-o".into());
        args.push(pot_file.clone().into());
        let mut files_from = OsString::from("--files-from=");
        files_from.push(&list_file);
        args.push(files_from);

        let output = self.runner.run("xgettext", &args)?;
        let errors = self.runner.parse_stderr(&output);
        if !output.success || !pot_file.exists() {
            errors.log_errors();
            return Err(Error::extraction_error(ExtractionError::Unspecified, None));
        }
        Ok(ExtractionOutput { pot_file, errors })
    }
}

/// Source strings added and removed by an update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeStats {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub errors: ParsedGettextErrors,
}

impl MergeStats {
    pub fn changes_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Compares source strings (keyed by context and text) of a catalog and its new reference.
pub fn compute_merge_stats(catalog: &Catalog, reference: &Catalog) -> MergeStats {
    let known: HashSet<_> = catalog.items().iter().map(CatalogItem::key).collect();
    let fresh: HashSet<_> = reference.items().iter().map(CatalogItem::key).collect();

    MergeStats {
        added: reference
            .items()
            .iter()
            .filter(|item| !known.contains(&item.key()))
            .map(|item| item.string.clone())
            .collect(),
        removed: catalog
            .items()
            .iter()
            .filter(|item| !fresh.contains(&item.key()))
            .map(|item| item.string.clone())
            .collect(),
        errors: ParsedGettextErrors::default(),
    }
}

/// Everything an update needs besides the catalogs.
pub struct UpdateContext<'a> {
    pub config: &'a CatalogConfig,
    pub cancellation: &'a CancellationToken,
    pub progress: &'a dyn Progress,
    /// Used after merging when the config asks for it.
    pub translation_memory: Option<&'a dyn TranslationMemory>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(config: &'a CatalogConfig, cancellation: &'a CancellationToken) -> Self {
        UpdateContext {
            config,
            cancellation,
            progress: &NoProgress,
            translation_memory: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_translation_memory(mut self, tm: &'a dyn TranslationMemory) -> Self {
        self.translation_memory = Some(tm);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub catalog: Catalog,
    pub errors: ParsedGettextErrors,
}

/// Merges a copy of `catalog` with `reference`, pre-translating new strings
/// when the merge behavior asks for the translation memory.
pub fn merge_catalog_with_reference(
    catalog: &Catalog,
    reference: &Catalog,
    ctx: &UpdateContext<'_>,
) -> Result<MergeResult, Error> {
    let mut updated = catalog.clone();
    let errors = updated.update_from_pot(reference, false, ctx.config)?;

    let wants_tm = ctx.config.merge_behavior == MergeBehavior::UseTm && ctx.config.use_tm;
    if let (true, Some(tm), false) = (wants_tm, ctx.translation_memory, updated.is_pot()) {
        match pretranslate(&mut updated, tm, &PreTranslateOptions::default(), ctx.cancellation, ctx.progress) {
            Ok(count) => debug!("pre-translated {} merged strings", count),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => warn!("pre-translation after merge skipped: {}", e),
        }
    }

    Ok(MergeResult { catalog: updated, errors })
}

/// Loads a reference (template) file, silently fixing duplicate strings.
pub fn load_reference_file(path: impl AsRef<Path>, config: &CatalogConfig) -> Result<Catalog, Error> {
    let path = path.as_ref();
    let mut reference = Catalog::load(path, LoadFlags::new().with_ignore_translations(true)).map_err(|e| {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        Error::task_error(format!("The file \"{}\" couldn't be opened.", name), e.to_string())
    })?;

    // duplicates are common in WordPress templates
    if reference.has_duplicate_items() {
        if let Err(e) = reference.fix_duplicate_items(config) {
            warn!("couldn't remove duplicates from {}: {}", path.display(), e);
        }
    }
    Ok(reference)
}

/// Extracts a fresh template from the sources described in the catalog's header.
pub fn extract_from_sources(
    catalog: &Catalog,
    extractor: &dyn Extractor,
    progress: &dyn Progress,
) -> Result<(Catalog, ParsedGettextErrors), Error> {
    progress.message("Collecting source files…");
    let spec = SourceCodeSpec::from_catalog(catalog)
        .ok_or_else(|| Error::extraction_error(ExtractionError::NoSourcesFound, None))?;
    let files = spec.collect_files()?;
    if files.is_empty() {
        return Err(Error::extraction_error(
            ExtractionError::NoSourcesFound,
            Some(spec.base_path),
        ));
    }

    progress.message(&format!(
        "Extracting translatable strings from {} file(s)…",
        files.len()
    ));
    let tmp = TempDir::new()?;
    let output = extractor.extract(&spec, &files, tmp.path())?;
    info!(
        "{} extracted strings from {} files",
        extractor.name(),
        files.len()
    );

    let reference = Catalog::load(&output.pot_file, LoadFlags::new().with_ignore_header(true)).map_err(|e| {
        error!("Failed to load file with extracted translations: {}", e);
        Error::extraction_error(ExtractionError::Unspecified, None)
    })?;
    Ok((reference, output.errors))
}

/// Turns extraction failures into user-facing task errors.
pub fn explain_extraction_error(err: Error) -> Error {
    let (kind, file) = match err {
        Error::Extraction { kind, file } => (kind, file),
        other => return other,
    };

    let mut explain = match kind {
        ExtractionError::NoSourcesFound => {
            "Translations couldn't be updated from the source code, because no code was found in the location specified in the file's properties.".to_string()
        }
        ExtractionError::PermissionDenied => {
            "You don't have permission to read source code files from the location specified in the file's properties.".to_string()
        }
        // details come from the logged tool output
        ExtractionError::Unspecified => String::new(),
    };
    if let Some(file) = file.filter(|f| f.as_path() != Path::new(".")) {
        if !explain.is_empty() {
            explain.push_str("\n\n");
        }
        explain.push_str(&format!("In: {}", file.display()));
    }
    Error::task_error(kind.to_string(), explain)
}

/// Human readable result of an update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSummary {
    pub summary: String,
    /// `(label, value)` pairs.
    pub details: Vec<(String, String)>,
    pub stats: MergeStats,
}

impl UpdateSummary {
    fn from_stats(stats: MergeStats) -> Self {
        let changes = stats.changes_count();
        if changes == 0 {
            return UpdateSummary {
                summary: "Translation file is already up to date, no changes to strings were made.".to_string(),
                details: Vec::new(),
                stats,
            };
        }

        let summary = if changes == 1 {
            "Translation file was updated with 1 change.".to_string()
        } else {
            format!("Translation file was updated with {} changes.", changes)
        };
        UpdateSummary {
            summary,
            details: vec![
                ("New strings to translate:".to_string(), stats.added.len().to_string()),
                (
                    "Removed strings (no longer used):".to_string(),
                    stats.removed.len().to_string(),
                ),
            ],
            stats,
        }
    }
}

/// The updated catalog and what changed.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub catalog: Catalog,
    pub summary: UpdateSummary,
}

fn perform_update<F>(
    catalog: &Catalog,
    ctx: &UpdateContext<'_>,
    obtain_cost: f64,
    obtain_reference: F,
) -> Result<UpdateOutcome, Error>
where
    F: FnOnce() -> Result<(Catalog, ParsedGettextErrors), Error>,
{
    let step = (1.0 - obtain_cost) / 2.0;
    ctx.progress.fraction(0.0);
    let (reference, errors) = obtain_reference()?;
    ctx.progress.fraction(obtain_cost);
    ctx.cancellation.check()?;

    ctx.progress.message("Determining differences…");
    let mut stats = compute_merge_stats(catalog, &reference);
    stats.errors = errors;
    ctx.progress.fraction(obtain_cost + step);
    ctx.cancellation.check()?;

    ctx.progress.message("Merging differences…");
    let merged = merge_catalog_with_reference(catalog, &reference, ctx).map_err(|e| match e {
        Error::Cancelled => e,
        e => Error::task_error("Failed to load file with extracted translations.", e.to_string()),
    })?;
    stats.errors.items.extend(merged.errors.items);
    ctx.progress.fraction(1.0);

    Ok(UpdateOutcome {
        catalog: merged.catalog,
        summary: UpdateSummary::from_stats(stats),
    })
}

/// Updates a copy of `catalog` from a template file.
pub fn perform_update_from_reference(
    catalog: &Catalog,
    reference_file: impl AsRef<Path>,
    ctx: &UpdateContext<'_>,
) -> Result<UpdateOutcome, Error> {
    let reference_file = reference_file.as_ref();
    perform_update(catalog, ctx, 0.5, || {
        load_reference_file(reference_file, ctx.config).map(|r| (r, ParsedGettextErrors::default()))
    })
}

/// Updates a copy of `catalog` from freshly extracted source strings.
pub fn perform_update_from_sources(
    catalog: &Catalog,
    extractor: &dyn Extractor,
    ctx: &UpdateContext<'_>,
) -> Result<UpdateOutcome, Error> {
    perform_update(catalog, ctx, 0.9, || {
        extract_from_sources(catalog, extractor, ctx.progress).map_err(explain_extraction_error)
    })
}
