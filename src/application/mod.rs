//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod ports;
pub mod session_flow;
pub mod transfer;

// Re-export use cases
pub use session_flow::{FlowCallbacks, FlowError, RunSessionUseCase, SessionOutcome};
pub use transfer::{upload_with_backoff, TransferError};
