//! Stdin-backed session prompter

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use colored::*;
use tokio::task;

use crate::application::ports::{RetryDecision, SessionPrompter};
use crate::application::transfer::TransferError;

/// Prompter that drives the session from an interactive terminal:
/// Enter finishes the current step, y/n answers the manual-retry question.
pub struct StdinPrompter;

impl StdinPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> String {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        line
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionPrompter for StdinPrompter {
    async fn wait_for_advance(&self, step: u32, step_count: u32, prompt: &str) {
        eprintln!();
        eprintln!(
            "{} {}",
            format!("[{}/{}]", step + 1, step_count).cyan().bold(),
            prompt.bold()
        );
        eprint!("{} Recording... press Enter to finish this answer ", "●".red());
        let _ = io::stderr().flush();

        // Stdin reads block; keep them off the runtime threads.
        let _ = task::spawn_blocking(Self::read_line).await;
    }

    async fn retry_decision(&self, _step: u32, error: &TransferError) -> RetryDecision {
        eprintln!("{} Upload failed: {}", "✗".red(), error);
        eprint!("{} Retry this upload? [y/N] ", "?".yellow());
        let _ = io::stderr().flush();

        let line = task::spawn_blocking(Self::read_line)
            .await
            .unwrap_or_default();

        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => RetryDecision::Retry,
            _ => RetryDecision::Abort,
        }
    }
}
