use pocatalog_cli::progress::spinner;
use pocatalog::{Catalog, LoadFlags};
use std::fs::File;
use std::io::Write;

/// Run the debug command: read a catalog and output its structure as JSON.
pub fn run_debug_command(input: String, output: Option<String>) {
    let progress_bar = spinner();

    progress_bar.set_message("Reading input file...");
    let catalog = match Catalog::load(&input, LoadFlags::default()) {
        Ok(catalog) => catalog,
        Err(e) => {
            progress_bar.finish_with_message("❌ Error reading input file");
            eprintln!("Error reading {}: {}", input, e);
            std::process::exit(1);
        }
    };

    progress_bar.set_message("Converting to JSON...");
    let json = catalog.to_json().unwrap_or_else(|e| {
        progress_bar.finish_with_message("❌ Error serializing to JSON");
        eprintln!("Error serializing to JSON: {}", e);
        std::process::exit(1);
    });

    match output {
        Some(output_path) => {
            progress_bar.set_message("Writing output file...");
            if let Err(e) =
                File::create(&output_path).and_then(|mut f| f.write_all(json.as_bytes()))
            {
                progress_bar.finish_with_message("❌ Error writing output file");
                eprintln!("Error writing to {}: {}", output_path, e);
                std::process::exit(1);
            }
            progress_bar
                .finish_with_message(format!("✅ Debug output written to: {}", output_path));
        }
        None => {
            progress_bar.finish_and_clear();
            println!("{}", json);
        }
    }
}
