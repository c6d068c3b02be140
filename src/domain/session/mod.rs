//! Session domain: the recording flow entity and its phase machine

pub mod phase;
#[allow(clippy::module_inception)]
pub mod session;

pub use phase::{InvalidPhaseTransition, SessionFlow, SessionPhase};
pub use session::{Session, SessionComplete, SessionState};
