//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_cue;
pub mod capture;
pub mod collector;
pub mod config;
pub mod interaction;
pub mod state_store;

// Re-export common types
pub use audio_cue::{AudioCue, AudioCueError, AudioCueType};
pub use config::ConfigStore;
pub use capture::{CaptureDevice, DeviceError, RecordError, SpanRecorder};
pub use collector::{
    CollectorClient, FinalizeError, SegmentPayload, UploadError, UploadReceipt,
};
pub use interaction::{RetryDecision, SessionPrompter};
pub use state_store::{SessionStore, StoreError};
