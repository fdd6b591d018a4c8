//! Progress bar utilities for long-running operations
//!
//! Visual feedback while history downloads and window sweeps run, using
//! the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

/// Progress bar for a window sweep, one step per window size
pub struct SweepProgress {
    pub progress: ProgressBar,
}

impl SweepProgress {
    pub fn new(total_windows: usize) -> Self {
        let progress = ProgressBar::new(total_windows as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} windows\n{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress.set_style(style);

        Self { progress }
    }

    /// Safe to call from rayon workers.
    pub fn window_done(&self, window_size: usize) {
        self.progress.inc(1);
        self.progress.set_message(format!("📊 Finished window {}", window_size));
    }

    pub fn finish(&self, best: Option<(usize, Decimal)>) {
        let message = match best {
            Some((window, value)) => format!("✅ Sweep complete! Best window {} (final value {})", window, value),
            None => "❌ Sweep produced no results".to_string(),
        };
        self.progress.finish_with_message(message);
    }
}

/// Spinner for quick operations
pub struct Spinner {
    pub spinner: ProgressBar,
}

impl Spinner {
    /// Create a new spinner
    pub fn new(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(message.to_string());

        Self { spinner }
    }

    /// Finish spinner with success
    pub fn finish(&self, message: &str) {
        self.spinner.finish_with_message(format!("✅ {}", message));
    }

    /// Finish spinner with error
    pub fn finish_with_error(&self, message: &str) {
        self.spinner.finish_with_message(format!("❌ {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sweep_progress() {
        let progress = SweepProgress::new(3);
        progress.window_done(5);
        progress.window_done(10);
        progress.finish(Some((10, dec!(1234.5))));
        assert_eq!(progress.progress.position(), 2);
    }

    #[test]
    fn test_spinner() {
        let spinner = Spinner::new("Loading...");
        std::thread::sleep(Duration::from_millis(100));
        spinner.finish("Loaded");
    }
}
