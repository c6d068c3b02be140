//! Segment transfer with bounded exponential backoff

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::domain::transfer::RetryPolicy;

use super::ports::{CollectorClient, SegmentPayload, UploadError, UploadReceipt};

/// Final outcome of a transfer once automatic retry has been settled
#[derive(Debug, Clone, Error)]
pub enum TransferError {
    /// The collector rejected the request itself (4xx). Retrying the
    /// unchanged payload cannot succeed, so this fails on the first
    /// attempt with no wait.
    #[error("Upload rejected (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    /// Transient failures persisted past the retry budget
    #[error("Upload failed after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },
}

/// Upload one segment, retrying transient failures with doubling delays
/// until the budget is spent.
///
/// The payload is resent verbatim on every attempt. `on_retry_wait` fires
/// before each backoff wait with the retries still remaining and the
/// upcoming delay, so the caller can surface the wait to the user.
/// Client errors return immediately; exhaustion carries the last
/// transient failure's message.
pub async fn upload_with_backoff<C, F>(
    collector: &C,
    payload: &SegmentPayload,
    policy: RetryPolicy,
    mut on_retry_wait: F,
) -> Result<UploadReceipt, TransferError>
where
    C: CollectorClient + ?Sized,
    F: FnMut(u32, Duration),
{
    let mut retries_remaining = policy.budget();
    let mut delay = policy.base_delay();

    loop {
        match collector.upload_segment(payload).await {
            Ok(receipt) => return Ok(receipt),
            Err(UploadError::Rejected { status, message }) => {
                return Err(TransferError::Client { status, message });
            }
            Err(UploadError::Transient { message, .. }) => {
                if retries_remaining == 0 {
                    return Err(TransferError::Exhausted {
                        attempts: policy.max_attempts(),
                        message,
                    });
                }
                on_retry_wait(retries_remaining, delay);
                sleep(delay).await;
                retries_remaining -= 1;
                delay = delay.saturating_mul(2);
            }
        }
    }
}
