use pocatalog::{Catalog, CatalogConfig, GettextRunner, IssueKind, LoadFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Serialize)]
pub struct Problem {
    pub severity: Severity,
    /// 1-based line in the file, when the problem has one.
    pub line: Option<usize>,
    pub message: String,
}

impl Problem {
    fn error(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line,
            message: message.into(),
        }
    }

    fn warning(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    /// False when `msgfmt` wasn't available and only structural checks ran.
    pub msgfmt_checked: bool,
    pub problems: Vec<Problem>,
}

impl FileReport {
    pub fn error_count(&self) -> usize {
        self.problems
            .iter()
            .filter(|p| matches!(p.severity, Severity::Error))
            .count()
    }
}

/// Run every check on one catalog file.
pub fn check_file(path: &Path, config: &CatalogConfig, use_msgfmt: bool) -> FileReport {
    let mut report = FileReport {
        file: path.display().to_string(),
        msgfmt_checked: false,
        problems: Vec::new(),
    };

    let mut catalog = match Catalog::load(path, LoadFlags::default()) {
        Ok(catalog) => catalog,
        Err(pocatalog::Error::Parse { line, message }) => {
            report.problems.push(Problem::error(Some(line), message));
            return report;
        }
        Err(e) => {
            report.problems.push(Problem::error(None, e.to_string()));
            return report;
        }
    };

    for issue in catalog.charset_issues() {
        report.problems.push(Problem::warning(None, issue.to_string()));
    }
    if catalog.has_wrong_plural_forms_count() {
        report.problems.push(Problem::warning(
            None,
            format!(
                "Plural-Forms declares {} forms, which doesn't match the translations",
                catalog.plural_forms_count()
            ),
        ));
    }
    if catalog.has_duplicate_items() {
        report.problems.push(Problem::error(
            None,
            "The file contains duplicate entries; run `pocatalog dedup` to fix them",
        ));
    }

    if use_msgfmt && !catalog.is_pot() {
        match catalog.validate(Some(path), config) {
            Ok(_) => {
                report.msgfmt_checked = true;
                for item in catalog.items() {
                    let Some(issue) = &item.issue else {
                        continue;
                    };
                    let line = Some(item.line_number);
                    report.problems.push(match issue.kind {
                        IssueKind::Error => Problem::error(line, issue.message.clone()),
                        IssueKind::Warning => Problem::warning(line, issue.message.clone()),
                    });
                }
            }
            Err(e) => report
                .problems
                .push(Problem::warning(None, format!("msgfmt check failed: {}", e))),
        }
    }
    report
}

/// Check all files and print the findings; returns true when no errors were found.
pub fn run_check(paths: &[PathBuf], config: &CatalogConfig, json_output: bool) -> bool {
    let use_msgfmt = GettextRunner::from_config(config).is_available("msgfmt");
    if !use_msgfmt {
        tracing::warn!("msgfmt not found, only structural checks will run");
    }

    let reports: Vec<FileReport> = paths
        .iter()
        .map(|path| check_file(path, config, use_msgfmt))
        .collect();
    let errors: usize = reports.iter().map(FileReport::error_count).sum();

    if json_output {
        let body = serde_json::json!({
            "files": reports,
            "errors": errors,
        });
        match serde_json::to_string_pretty(&body) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error serializing to JSON: {}", e),
        }
        return errors == 0;
    }

    for report in &reports {
        if report.problems.is_empty() {
            println!("✅ {}", report.file);
            continue;
        }
        let marker = if report.error_count() > 0 { "❌" } else { "⚠️" };
        println!("{} {}", marker, report.file);
        for problem in &report.problems {
            let severity = match problem.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            match problem.line {
                Some(line) => println!("  {}:{}: {}: {}", report.file, line, severity, problem.message),
                None => println!("  {}: {}: {}", report.file, severity, problem.message),
            }
        }
    }
    errors == 0
}
