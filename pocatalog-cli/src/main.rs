mod check;
mod debug;
mod normalize;
mod stats;
mod update;
mod view;

use clap::{Parser, Subcommand};
use pocatalog::{Catalog, CatalogConfig, LoadFlags};
use pocatalog_cli::{expand_input_globs, load_config, logging::init_logging, progress::spinner};

use crate::check::run_check;
use crate::debug::run_debug_command;
use crate::normalize::{run_compile_command, run_dedup_command, run_normalize_command};
use crate::stats::print_stats;
use crate::update::run_update_command;
use crate::view::print_view;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Show debug logging (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with catalog settings (line endings, wrapping, gettext path, ...)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// View the entries of a PO/POT file.
    View {
        /// The input file to view
        #[arg(short, long)]
        input: String,

        /// Only show untranslated and fuzzy entries
        #[arg(short, long)]
        untranslated: bool,

        /// Display full value without truncation
        #[arg(long)]
        full: bool,
    },

    /// Show translation statistics for one or more files.
    Stats {
        /// Files, directories or glob patterns
        #[arg(short, long, num_args = 1.., required = true)]
        inputs: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check files for structural, charset and msgfmt problems.
    Check {
        /// Files, directories or glob patterns
        #[arg(short, long, num_args = 1.., required = true)]
        inputs: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a file in canonical gettext formatting.
    Normalize {
        /// The input file to normalize
        #[arg(short, long)]
        input: String,

        /// Write to this file instead of overwriting the input
        #[arg(short, long)]
        output: Option<String>,

        /// Don't compile an MO file next to the saved PO file
        #[arg(long)]
        no_mo: bool,
    },

    /// Compile a PO file into a binary MO file.
    Compile {
        /// The PO file to compile
        #[arg(short, long)]
        input: String,

        /// The MO file to write (defaults to the input with a .mo extension)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Update a translation from a POT template or from source code.
    Update {
        /// The PO file to update
        #[arg(short, long)]
        input: String,

        /// The POT file to merge; without it strings are extracted from sources
        #[arg(short, long)]
        pot: Option<String>,

        /// Report the changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge duplicate entries of a file in place.
    Dedup {
        /// The file to fix
        #[arg(short, long)]
        input: String,
    },

    /// Dump a file's parsed structure as JSON.
    Debug {
        /// The input file to dump
        #[arg(short, long)]
        input: String,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn expand_or_exit(inputs: &[String]) -> Vec<std::path::PathBuf> {
    expand_input_globs(inputs).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config: CatalogConfig = load_config(args.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match args.commands {
        Commands::View {
            input,
            untranslated,
            full,
        } => {
            let progress_bar = spinner();
            progress_bar.set_message(format!("Reading {}...", input));
            let catalog = Catalog::load(&input, LoadFlags::default()).unwrap_or_else(|e| {
                progress_bar.finish_with_message("❌ Error reading input file");
                eprintln!("Error reading {}: {}", input, e);
                std::process::exit(1);
            });
            progress_bar.finish_and_clear();
            print_view(&catalog, untranslated, full);
        }
        Commands::Stats { inputs, json } => {
            if !print_stats(&expand_or_exit(&inputs), json) {
                std::process::exit(1);
            }
        }
        Commands::Check { inputs, json } => {
            if !run_check(&expand_or_exit(&inputs), &config, json) {
                std::process::exit(1);
            }
        }
        Commands::Normalize {
            input,
            output,
            no_mo,
        } => run_normalize_command(input, output, no_mo, &config),
        Commands::Compile { input, output } => run_compile_command(input, output, &config),
        Commands::Update {
            input,
            pot,
            dry_run,
        } => run_update_command(input, pot, dry_run, &config),
        Commands::Dedup { input } => run_dedup_command(input, &config),
        Commands::Debug { input, output } => run_debug_command(input, output),
    }
}
