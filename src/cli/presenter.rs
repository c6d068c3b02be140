//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Presenter for CLI output formatting.
///
/// The spinner state is interior-mutable so the presenter can be shared
/// into progress callbacks behind an `Arc`.
pub struct Presenter {
    spinner: Mutex<Option<ProgressBar>>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message, replacing any active one
    pub fn start_spinner(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(previous) = guard.take() {
                previous.finish_and_clear();
            }
            *guard = Some(spinner);
        }
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Ok(guard) = self.spinner.lock() {
            if let Some(spinner) = guard.as_ref() {
                spinner.set_message(message.to_string());
            }
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&self, message: &str) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(spinner) = guard.take() {
                spinner.finish_with_message(format!("{} {}", "✓".green(), message));
            }
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&self, message: &str) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(spinner) = guard.take() {
                spinner.finish_with_message(format!("{} {}", "✗".red(), message));
            }
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(spinner) = guard.take() {
                spinner.finish_and_clear();
            }
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Whether a spinner is currently running
    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_lifecycle_through_shared_reference() {
        let presenter = Arc::new(Presenter::new());

        presenter.start_spinner("Uploading...");
        assert!(presenter.is_spinner_active());

        let shared = Arc::clone(&presenter);
        shared.update_spinner("retrying in 2s");
        shared.spinner_success("uploaded");
        assert!(!presenter.is_spinner_active());

        // Finishing again or stopping with no spinner is a no-op
        presenter.spinner_success("again");
        presenter.stop_spinner();
        assert!(!presenter.is_spinner_active());
    }

    #[test]
    fn start_replaces_active_spinner() {
        let presenter = Presenter::new();
        presenter.start_spinner("first");
        presenter.start_spinner("second");
        assert!(presenter.is_spinner_active());
        presenter.stop_spinner();
        assert!(!presenter.is_spinner_active());
    }
}
