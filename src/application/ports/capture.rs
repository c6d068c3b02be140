//! Capture port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::segment::SegmentData;

/// Errors acquiring or holding the live capture source.
/// Fatal to the session; the user must grant access and restart.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("No capture device available")]
    NoDevice,

    #[error("Access to the capture device was denied: {0}")]
    AccessDenied(String),

    #[error("Failed to open capture device: {0}")]
    OpenFailed(String),
}

/// Errors within a recording span
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("No data was captured for this span")]
    EmptySpan,

    #[error("The capture source was not acquired")]
    SourceNotLive,
}

/// Port for the live capture source.
///
/// The source is acquired once at session start, held exclusively for the
/// session's duration, and released exactly once. `release` is idempotent
/// and safe on an already-released source.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the live source. Fails with [`DeviceError`] when no
    /// matching device exists or access is denied.
    async fn acquire(&self) -> Result<(), DeviceError>;

    /// Stop the underlying source. Idempotent.
    async fn release(&self);

    /// Whether the source is currently acquired
    fn is_live(&self) -> bool;
}

/// Port for start/stop-bounded recording spans on the live source.
///
/// One span is active at a time; `end` finalizes the span into exactly
/// one immutable segment. Ending without an active span is a no-op at
/// the domain level, surfaced here as `RecordError::SourceNotLive` only
/// when the device itself was never acquired.
#[async_trait]
pub trait SpanRecorder: Send + Sync {
    /// Begin a recording span for the given step
    async fn begin(&self, step: u32) -> Result<(), RecordError>;

    /// End the active span and finalize its chunks into one segment
    async fn end(&self) -> Result<SegmentData, RecordError>;
}
