use pocatalog::{Catalog, CatalogStats, LoadFlags};
use rayon::prelude::*;
use serde_json::json;
use std::path::PathBuf;

struct FileStats {
    path: PathBuf,
    language: Option<String>,
    stats: CatalogStats,
    obsolete: usize,
    wrong_plural_forms: bool,
}

fn collect(path: &PathBuf) -> Result<FileStats, String> {
    let catalog = Catalog::load(path, LoadFlags::default())
        .map_err(|e| format!("Error reading {}: {}", path.display(), e))?;
    Ok(FileStats {
        path: path.clone(),
        language: catalog.language().map(|l| l.code().to_string()),
        stats: catalog.statistics(),
        obsolete: catalog.deleted_items().len(),
        wrong_plural_forms: catalog.has_wrong_plural_forms_count(),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Print translation statistics for each file; returns false if any file failed to load.
pub fn print_stats(paths: &[PathBuf], json_output: bool) -> bool {
    let results: Vec<Result<FileStats, String>> = paths.par_iter().map(collect).collect();

    let mut ok = true;
    let mut files = Vec::new();
    for result in results {
        match result {
            Ok(stats) => files.push(stats),
            Err(e) => {
                eprintln!("{}", e);
                ok = false;
            }
        }
    }

    let mut total = CatalogStats::default();
    for file in &files {
        total.all += file.stats.all;
        total.translated += file.stats.translated;
        total.fuzzy += file.stats.fuzzy;
        total.bad += file.stats.bad;
        total.untranslated += file.stats.untranslated;
    }

    if json_output {
        let per_file: Vec<_> = files
            .iter()
            .map(|f| {
                json!({
                    "file": f.path.display().to_string(),
                    "language": f.language,
                    "total": f.stats.all,
                    "translated": f.stats.translated,
                    "fuzzy": f.stats.fuzzy,
                    "untranslated": f.stats.untranslated,
                    "obsolete": f.obsolete,
                    "completion_percent": round2(f.stats.completion()),
                    "wrong_plural_forms": f.wrong_plural_forms,
                })
            })
            .collect();
        let body = json!({
            "summary": {
                "files": files.len(),
                "total": total.all,
                "translated": total.translated,
                "fuzzy": total.fuzzy,
                "untranslated": total.untranslated,
                "completion_percent": round2(total.completion()),
            },
            "files": per_file,
        });
        match serde_json::to_string_pretty(&body) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing to JSON: {}", e);
                return false;
            }
        }
        return ok;
    }

    println!("=== Stats ===");
    println!("Files: {}", files.len());
    for f in &files {
        println!("\n{}", f.path.display());
        println!("  Language: {}", f.language.as_deref().unwrap_or("(none)"));
        println!("  Total: {}", f.stats.all);
        println!("  Translated: {}", f.stats.translated);
        println!("  Fuzzy: {}", f.stats.fuzzy);
        println!("  Untranslated: {}", f.stats.untranslated);
        if f.obsolete > 0 {
            println!("  Obsolete: {}", f.obsolete);
        }
        println!("  Completion: {:.2}%", f.stats.completion());
        if f.wrong_plural_forms {
            println!("  Warning: Plural-Forms header doesn't match the translations");
        }
    }
    if files.len() > 1 {
        println!("\nOverall completion: {:.2}%", total.completion());
    }
    ok
}
