use pocatalog_cli::progress::spinner;
use indicatif::ProgressBar;
use pocatalog::{Catalog, CatalogConfig, CompilationStatus, LoadFlags, SaveResult};
use std::path::{Path, PathBuf};

fn load_or_exit(progress_bar: &ProgressBar, input: &str) -> Catalog {
    progress_bar.set_message(format!("Reading {}...", input));
    match Catalog::load(input, LoadFlags::default()) {
        Ok(catalog) => catalog,
        Err(e) => {
            progress_bar.finish_with_message("❌ Error reading input file");
            eprintln!("Error reading {}: {}", input, e);
            std::process::exit(1);
        }
    }
}

/// Print what a save reported besides success.
pub fn report_save(result: &SaveResult) {
    for notice in &result.notices {
        eprintln!("Warning: {}", notice);
    }
    if result.validation.errors > 0 || result.validation.warnings > 0 {
        eprintln!(
            "Validation: {} error(s), {} warning(s); run `pocatalog check` for details",
            result.validation.errors, result.validation.warnings
        );
    }
    match result.mo_status {
        CompilationStatus::Success => println!("MO file compiled"),
        CompilationStatus::Error => eprintln!("Warning: MO file could not be compiled"),
        CompilationStatus::NotDone => {}
    }
}

/// Save `catalog` to `output`, exiting on failure.
pub fn save_or_exit(
    progress_bar: &ProgressBar,
    catalog: &mut Catalog,
    output: &Path,
    save_mo: bool,
    config: &CatalogConfig,
) -> SaveResult {
    progress_bar.set_message(format!("Writing {}...", output.display()));
    match catalog.save(output, save_mo, config) {
        Ok(result) => {
            progress_bar.finish_with_message(format!("✅ Saved {}", output.display()));
            result
        }
        Err(e) => {
            progress_bar.finish_with_message("❌ Error saving file");
            eprintln!("Error writing {}: {}", output.display(), e);
            std::process::exit(1);
        }
    }
}

/// Rewrite a catalog in canonical form, optionally to a different file.
pub fn run_normalize_command(input: String, output: Option<String>, no_mo: bool, config: &CatalogConfig) {
    let progress_bar = spinner();
    let mut catalog = load_or_exit(&progress_bar, &input);
    let output = output.unwrap_or_else(|| input.clone());
    let result = save_or_exit(
        &progress_bar,
        &mut catalog,
        Path::new(&output),
        config.compile_mo && !no_mo,
        config,
    );
    report_save(&result);
}

/// Merge duplicate entries with `msguniq` and save the result in place.
pub fn run_dedup_command(input: String, config: &CatalogConfig) {
    let progress_bar = spinner();
    let mut catalog = load_or_exit(&progress_bar, &input);
    if !catalog.has_duplicate_items() {
        progress_bar.finish_with_message(format!("✅ No duplicate entries in {}", input));
        return;
    }

    let before = catalog.items().len();
    progress_bar.set_message("Merging duplicate entries...");
    if let Err(e) = catalog.fix_duplicate_items(config) {
        progress_bar.finish_with_message("❌ Error merging duplicates");
        eprintln!("Error fixing {}: {}", input, e);
        std::process::exit(1);
    }
    let removed = before.saturating_sub(catalog.items().len());
    let result = save_or_exit(&progress_bar, &mut catalog, Path::new(&input), false, config);
    println!("Merged {} duplicate entr{}", removed, if removed == 1 { "y" } else { "ies" });
    report_save(&result);
}

/// Compile a PO file into a binary MO file.
pub fn run_compile_command(input: String, output: Option<String>, config: &CatalogConfig) {
    let progress_bar = spinner();
    let mut catalog = load_or_exit(&progress_bar, &input);
    if catalog.is_pot() {
        progress_bar.finish_with_message("❌ Templates cannot be compiled");
        eprintln!("{} is a POT template; compile a translation instead", input);
        std::process::exit(1);
    }
    let output = output
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(&input).with_extension("mo"));

    progress_bar.set_message(format!("Compiling {}...", output.display()));
    match catalog.compile_to_mo(&output, config) {
        Ok(()) => progress_bar.finish_with_message(format!("✅ Compiled {}", output.display())),
        Err(e) => {
            progress_bar.finish_with_message("❌ Compilation failed");
            eprintln!("Error compiling {}: {}", input, e);
            std::process::exit(1);
        }
    }
}
