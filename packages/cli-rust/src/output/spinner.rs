//! Spinner with elapsed time for long-running steps

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// A stderr spinner that ends in a one-line status mark
pub struct CommandSpinner {
    bar: ProgressBar,
    started: Instant,
    quiet: bool,
}

impl CommandSpinner {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            started: Instant::now(),
            quiet: false,
        }
    }

    /// Spinner that draws nothing when `quiet` is set
    pub fn new_maybe(message: &str, quiet: bool) -> Self {
        if quiet {
            return Self {
                bar: ProgressBar::hidden(),
                started: Instant::now(),
                quiet: true,
            };
        }
        Self::new(message)
    }

    pub fn update(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn success(&self, message: &str) {
        self.finish(style("✓").green().bold().to_string(), message);
    }

    pub fn warn(&self, message: &str) {
        self.finish(style("!").yellow().bold().to_string(), message);
    }

    pub fn fail(&self, message: &str) {
        self.finish(style("✗").red().bold().to_string(), message);
    }

    /// Remove the spinner without printing a status line
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn finish(&self, mark: String, message: &str) {
        self.bar.finish_and_clear();
        if self.quiet {
            return;
        }
        eprintln!(
            "{mark} {message} {}",
            style(format_elapsed(self.started.elapsed())).dim()
        );
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("({}m {}s)", secs / 60, secs % 60)
    } else {
        format!("({:.1}s)", elapsed.as_secs_f64())
    }
}
