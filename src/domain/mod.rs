//! Domain layer - Core business logic
//!
//! Contains value objects, entities, state machines, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod segment;
pub mod session;
pub mod transfer;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use segment::{CaptureSpan, SegmentData, SegmentEncoding, SpanState};
pub use session::{Session, SessionFlow, SessionPhase, SessionState};
pub use transfer::RetryPolicy;
