use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;

fn has_glob_meta(s: &str) -> bool {
    s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
}

fn is_catalog_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("po") | Some("pot")
    )
}

/// Directory to start walking from: everything before the first glob meta-character.
fn walk_root(pattern: &str) -> PathBuf {
    let end = pattern
        .find(|c| matches!(c, '*' | '?' | '[' | '{'))
        .unwrap_or(pattern.len());
    let prefix = Path::new(&pattern[..end]);
    if prefix.is_dir() {
        return prefix.to_path_buf();
    }
    match prefix.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn build_set(patterns: &[&String]) -> Result<GlobSet, String> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| format!("Failed to build glob set: {}", e))
}

/// Walk `root` honoring .gitignore, keeping catalog files accepted by `keep`.
fn walk_catalogs(root: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .git_ignore(true)
        .hidden(false)
        .build()
        .filter_map(Result::ok)
        .filter(|dent| dent.file_type().is_some_and(|t| t.is_file()))
        .map(|dent| dent.into_path())
        .filter(|path| is_catalog_file(path) && keep(path))
        .collect()
}

/// Expand command line inputs into catalog paths.
///
/// Plain files are kept as given, directories contribute every `.po`/`.pot`
/// file below them and glob patterns are matched while walking from their
/// static prefix. Roots are walked in parallel; the result is sorted and
/// free of duplicates. Patterns matching nothing are an error.
pub fn expand_input_globs(inputs: &[String]) -> Result<Vec<PathBuf>, String> {
    let patterns: Vec<&String> = inputs.iter().filter(|i| has_glob_meta(i)).collect();
    let set = build_set(&patterns)?;

    let mut roots: Vec<PathBuf> = Vec::new();
    for pattern in &patterns {
        let root = walk_root(pattern);
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    let mut results: Vec<PathBuf> = roots
        .par_iter()
        .flat_map(|root| {
            walk_catalogs(root, |path| set.is_match(path.strip_prefix(".").unwrap_or(path)))
        })
        .collect();

    for input in inputs.iter().filter(|i| !has_glob_meta(i)) {
        let path = PathBuf::from(input);
        if path.is_dir() {
            results.extend(walk_catalogs(&path, |_| true));
        } else {
            results.push(path);
        }
    }

    if results.is_empty() {
        return Err(format!("No catalog files matched: {}", inputs.join(", ")));
    }

    let mut seen = HashSet::new();
    results.retain(|path| seen.insert(path.clone()));
    results.sort();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_globs_and_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let po = tmp.path().join("po");
        fs::create_dir_all(po.join("extra")).unwrap();
        fs::write(po.join("fr.po"), "").unwrap();
        fs::write(po.join("de.po"), "").unwrap();
        fs::write(po.join("messages.pot"), "").unwrap();
        fs::write(po.join("README"), "").unwrap();
        fs::write(po.join("extra").join("cs.po"), "").unwrap();

        let pattern = format!("{}/*.po", po.display());
        let found = expand_input_globs(&[pattern]).unwrap();
        assert_eq!(found, vec![po.join("de.po"), po.join("fr.po")]);

        let all = expand_input_globs(&[po.display().to_string()]).unwrap();
        assert_eq!(all.len(), 4);
        assert!(!all.contains(&po.join("README")));
    }

    #[test]
    fn test_plain_files_kept_and_empty_match_fails() {
        let inputs = vec!["missing.po".to_string()];
        assert_eq!(expand_input_globs(&inputs).unwrap(), vec![PathBuf::from("missing.po")]);

        let tmp = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.po", tmp.path().display());
        assert!(expand_input_globs(&[pattern]).is_err());
    }
}
