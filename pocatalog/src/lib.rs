#![forbid(unsafe_code)]
//! Gettext translation catalogs for Rust.
//!
//! Reads PO/POT files into a structured [`Catalog`], keeps everything a
//! translator wrote (comments, references, wrapping, plural forms, obsolete
//! entries) and writes it back byte for byte where nothing changed. Merging,
//! validation and MO compilation are delegated to the GNU gettext tools.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pocatalog::{Catalog, CatalogConfig, LoadFlags};
//!
//! let config = CatalogConfig::default();
//! let mut catalog = Catalog::load("po/fr.po", LoadFlags::default())?;
//! let stats = catalog.statistics();
//! println!("{} of {} translated", stats.translated, stats.all);
//!
//! catalog.update_from_pot_file("po/messages.pot", false, &config)?;
//! catalog.save("po/fr.po", config.compile_mo, &config)?;
//! # Ok::<(), pocatalog::Error>(())
//! ```
//!
//! # Features
//!
//! - Tolerant parsing of real-world files, with charset detection and verification
//! - Faithful serialization, normalized through `msgcat`
//! - `msgmerge`-based updates from templates or freshly extracted sources
//! - `msgfmt -c` validation with diagnostics attached to items
//! - Parallel pre-translation from any [`TranslationMemory`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod escape;
pub mod header;
pub mod item;
pub mod language;
pub mod parser;
pub mod pretranslate;
pub mod reader;
pub mod task;
pub mod text_file;
pub mod tool;
pub mod update;

// Re-export most used types for easy consumption
pub use crate::{
    catalog::{
        Catalog, CatalogStats, CompilationStatus, FileType, SaveNotice, SaveResult,
        ValidationResults,
    },
    config::{CatalogConfig, LoadFlags, MergeBehavior},
    error::{Error, ExtractionError},
    header::HeaderData,
    item::{CatalogItem, DeletedItem, Issue, IssueKind},
    language::Language,
    pretranslate::{PreTranslateOptions, Suggestion, TranslationMemory, pretranslate},
    reader::WrapWidth,
    task::{CancellationToken, NoProgress, Progress},
    text_file::{CharsetIssue, LineEnding},
    tool::{GettextError, GettextErrorLevel, GettextRunner, ParsedGettextErrors},
    update::{
        Extractor, MergeStats, UpdateContext, UpdateOutcome, UpdateSummary, XgettextExtractor,
        perform_update_from_reference, perform_update_from_sources,
    },
};
