//! Filling in missing translations from a translation memory.
//!
//! Lookups run in parallel against an immutable catalog and produce
//! [`PreTranslation`] values; the owner then applies them in one pass.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    catalog::Catalog,
    error::Error,
    language::Language,
    task::{CancellationToken, Progress},
};

/// Suggestions scoring below this are not "good quality".
const GOOD_QUALITY_SCORE: f64 = 0.80;

/// One translation memory match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    /// Similarity between 0.0 and 1.0.
    pub score: f64,
    pub is_exact: bool,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Suggestion {
            text: text.into(),
            score,
            is_exact: score >= 1.0,
        }
    }
}

/// A source of previously made translations.
pub trait TranslationMemory: Sync {
    /// Matches for `text`, best first.
    fn search(&self, source_lang: &Language, lang: &Language, text: &str) -> Vec<Suggestion>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreTranslateOptions {
    /// Skip anything that isn't an exact match.
    pub only_exact: bool,
    pub only_good_quality: bool,
    /// Don't mark unambiguous exact matches as fuzzy.
    pub exact_not_fuzzy: bool,
}

impl PreTranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_only_exact(mut self, only_exact: bool) -> Self {
        self.only_exact = only_exact;
        self
    }

    pub fn with_only_good_quality(mut self, only_good_quality: bool) -> Self {
        self.only_good_quality = only_good_quality;
        self
    }

    pub fn with_exact_not_fuzzy(mut self, exact_not_fuzzy: bool) -> Self {
        self.exact_not_fuzzy = exact_not_fuzzy;
        self
    }
}

/// Translations found for one item, identified by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreTranslation {
    pub item_id: u32,
    /// `(plural form index, text)` pairs.
    pub translations: Vec<(usize, String)>,
    pub fuzzy: bool,
}

/// Chooses the best suggestion, returning its text and whether it needs review.
fn pick_suggestion(results: &[Suggestion], options: &PreTranslateOptions) -> Option<(String, bool)> {
    let best = results.first()?;
    if options.only_exact && !best.is_exact {
        return None;
    }
    if options.only_good_quality && best.score < GOOD_QUALITY_SCORE {
        return None;
    }

    // two different exact matches mean the context decides, so keep it fuzzy
    let unambiguous = best.is_exact && !results.get(1).is_some_and(|s| s.is_exact);
    let fuzzy = !(options.exact_not_fuzzy && unambiguous);
    Some((best.text.clone(), fuzzy))
}

fn languages(catalog: &Catalog) -> Result<(&Language, &Language), Error> {
    if catalog.source_is_symbolic_id() {
        return Err(Error::task_error(
            "Cannot pre-translate without source text.",
            "Pre-translation requires that source text is available. It doesn't work if only IDs without the actual text are used.",
        ));
    }
    let source = catalog.source_language().ok_or_else(|| {
        Error::task_error(
            "Cannot pre-translate from unknown language.",
            "Pre-translation requires that source text's language is known, and it couldn't be detected in this file.",
        )
    })?;
    let lang = catalog.language().ok_or_else(|| {
        Error::task_error(
            "Cannot pre-translate into unknown language.",
            "Set the translation's language first.",
        )
    })?;
    Ok((source, lang))
}

/// Looks up untranslated and fuzzy items in `tm`.
///
/// If `cancellation` fires, all results are discarded and
/// [`Error::Cancelled`] is returned.
pub fn compute_pretranslations(
    catalog: &Catalog,
    tm: &dyn TranslationMemory,
    options: &PreTranslateOptions,
    cancellation: &CancellationToken,
    progress: &dyn Progress,
) -> Result<Vec<PreTranslation>, Error> {
    let (source, lang) = languages(catalog)?;
    // only English-like plurals can be matched form by form
    let simple_plurals = lang.nplurals() == 2;

    progress.message("Pre-translating from translation memory…");
    let candidates: Vec<_> = catalog
        .items()
        .iter()
        .filter(|item| !item.is_translated() || item.is_fuzzy())
        .collect();
    let total = candidates.len().max(1);
    let done = AtomicUsize::new(0);

    let results: Vec<PreTranslation> = candidates
        .par_iter()
        .filter_map(|item| {
            if cancellation.is_cancelled() {
                return None;
            }

            let found = pick_suggestion(&tm.search(source, lang, &item.string), options);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.fraction(finished as f64 / total as f64);

            let (text, mut fuzzy) = found?;
            let mut translations = vec![(0, text)];
            if let (true, Some(plural)) = (simple_plurals, &item.plural) {
                if let Some((text, plural_fuzzy)) = pick_suggestion(&tm.search(source, lang, plural), options) {
                    translations.push((1, text));
                    fuzzy |= plural_fuzzy;
                }
            }
            Some(PreTranslation {
                item_id: item.id,
                translations,
                fuzzy,
            })
        })
        .collect();

    cancellation.check()?;
    debug!("{} of {} strings found in translation memory", results.len(), candidates.len());
    Ok(results)
}

/// Applies lookup results; returns the number of items changed.
pub fn apply_pretranslations(catalog: &mut Catalog, results: Vec<PreTranslation>) -> usize {
    let positions: HashMap<u32, usize> = catalog
        .items()
        .iter()
        .enumerate()
        .map(|(pos, item)| (item.id, pos))
        .collect();

    let mut applied = 0;
    for result in results {
        let Some(&pos) = positions.get(&result.item_id) else {
            continue;
        };
        let item = &mut catalog.items_mut()[pos];
        for (index, text) in result.translations {
            item.set_translation(index, text);
        }
        item.set_fuzzy(result.fuzzy);
        item.pre_translated = true;
        applied += 1;
    }
    applied
}

/// Pre-translates `catalog` in place; returns the number of items changed.
pub fn pretranslate(
    catalog: &mut Catalog,
    tm: &dyn TranslationMemory,
    options: &PreTranslateOptions,
    cancellation: &CancellationToken,
    progress: &dyn Progress,
) -> Result<usize, Error> {
    let results = compute_pretranslations(catalog, tm, options, cancellation, progress)?;
    let applied = apply_pretranslations(catalog, results);
    info!("pre-translated {} strings", applied);
    progress.message(&format!("Pre-translated {} string(s)", applied));
    Ok(applied)
}
