use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while regions are processed; the region count is unknown
/// up front because regions are enumerated lazily.
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(description: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} regions {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(description.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        ProgressTracker {
            bar,
        }
    }

    pub fn hidden() -> Self {
        ProgressTracker {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_position(&self, position: u64) {
        self.bar.set_position(position);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Completed");
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }
}
