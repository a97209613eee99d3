use indicatif::{ProgressBar, ProgressStyle};
use pocatalog::Progress;

/// A green spinner with a wide message, as used by every command.
pub fn spinner() -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress_bar
}

/// Forwards library progress reports to a terminal spinner.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix:>4.bold} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl Progress for SpinnerProgress {
    fn message(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn fraction(&self, done: f64) {
        let percent = (done.clamp(0.0, 1.0) * 100.0).round() as u64;
        self.bar.set_prefix(format!("{}%", percent));
        self.bar.tick();
    }
}
