//! CLI library for testing purposes

pub mod config;
pub mod logging;
pub mod path_glob;
pub mod progress;

pub use config::load_config;
pub use path_glob::expand_input_globs;
pub use progress::SpinnerProgress;
