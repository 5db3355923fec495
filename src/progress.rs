//! Progress display for dependency lookups
//!
//! Provides visual feedback on stderr using indicatif. The reporter is cheap
//! to clone so every lookup task can tick the same bar.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for a batch of lookups
#[derive(Clone)]
pub struct Progress {
    /// Whether progress display is enabled (disabled in quiet/JSON mode)
    enabled: bool,
    /// Current progress bar
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a new progress reporter
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a disabled progress reporter
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Start a progress bar for a known number of lookups
    pub fn start(&mut self, total: u64, message: &str) {
        if !self.enabled {
            return;
        }

        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("█▓▒░"));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Increment progress by one
    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Update the message
    pub fn set_message(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the current progress bar
    pub fn finish_and_clear(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        self.bar = None;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}
