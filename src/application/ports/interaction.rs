//! User interaction port interface

use async_trait::async_trait;

use crate::application::transfer::TransferError;

/// The user's answer when an upload has finally failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Resend the same segment with a fresh retry budget
    Retry,
    /// Abandon the session; persisted progress stays at this step
    Abort,
}

/// Port for the two points where the flow suspends on the user:
/// the explicit advance signal that ends a step's recording, and the
/// manual-retry decision after a transfer failure.
#[async_trait]
pub trait SessionPrompter: Send + Sync {
    /// Show the step's prompt and wait for the advance signal.
    /// `step` is 0-indexed; `prompt` is the text to present.
    async fn wait_for_advance(&self, step: u32, step_count: u32, prompt: &str);

    /// A transfer failed past its automatic budget (or with a client
    /// error); ask the user whether to resend the same segment.
    async fn retry_decision(&self, step: u32, error: &TransferError) -> RetryDecision;
}
