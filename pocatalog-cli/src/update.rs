use crate::normalize::{report_save, save_or_exit};
use pocatalog_cli::progress::{SpinnerProgress, spinner};
use pocatalog::{
    CancellationToken, Catalog, CatalogConfig, Error, LoadFlags, UpdateContext, XgettextExtractor,
    perform_update_from_reference, perform_update_from_sources,
};
use std::path::Path;

fn print_error(err: &Error) {
    match err {
        Error::Task { summary, details } => {
            eprintln!("Error: {}", summary);
            if !details.is_empty() {
                eprintln!("{}", details);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}

/// Update a translation from a POT file, or from its source code when no POT is given.
///
/// Source extraction reads the `X-Poedit-*` search path headers of the
/// catalog and runs `xgettext`.
pub fn run_update_command(input: String, pot: Option<String>, dry_run: bool, config: &CatalogConfig) {
    let progress = SpinnerProgress::new(spinner());
    progress.bar().set_message(format!("Reading {}...", input));
    let catalog = match Catalog::load(&input, LoadFlags::default()) {
        Ok(catalog) => catalog,
        Err(e) => {
            progress.bar().finish_with_message("❌ Error reading input file");
            eprintln!("Error reading {}: {}", input, e);
            std::process::exit(1);
        }
    };

    let token = CancellationToken::new();
    let ctx = UpdateContext::new(config, &token).with_progress(&progress);
    let result = match &pot {
        Some(pot) => perform_update_from_reference(&catalog, pot, &ctx),
        None => perform_update_from_sources(&catalog, &XgettextExtractor::new(config), &ctx),
    };
    let mut outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.bar().finish_with_message("❌ Update failed");
            print_error(&e);
            std::process::exit(1);
        }
    };

    let summary = &outcome.summary;
    if dry_run {
        progress.bar().finish_with_message("✅ Update computed (dry run, nothing saved)");
    } else {
        let result = save_or_exit(
            progress.bar(),
            &mut outcome.catalog,
            Path::new(&input),
            config.compile_mo,
            config,
        );
        report_save(&result);
    }

    println!("{}", summary.summary);
    for (label, value) in &summary.details {
        println!("  {} {}", label, value);
    }
    for added in &summary.stats.added {
        println!("  + {}", added);
    }
    for removed in &summary.stats.removed {
        println!("  - {}", removed);
    }
    for error in summary.stats.errors.errors() {
        eprintln!("Warning: {}", error);
    }
}
