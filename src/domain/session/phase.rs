//! Session flow phase state machine

use std::fmt;
use thiserror::Error;

/// Flow phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    AwaitingPermission,
    Recording(u32),
    Transferring(u32),
    AwaitingManualRetry(u32),
    Completed,
}

impl SessionPhase {
    /// Get the string representation (without the step)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPermission => "awaiting permission",
            Self::Recording(_) => "recording",
            Self::Transferring(_) => "transferring",
            Self::AwaitingManualRetry(_) => "awaiting manual retry",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recording(step)
            | Self::Transferring(step)
            | Self::AwaitingManualRetry(step) => {
                write!(f, "{} (step {})", self.as_str(), step)
            }
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// Error when an invalid phase transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid phase transition: cannot {action} while {current_phase}")]
pub struct InvalidPhaseTransition {
    pub current_phase: SessionPhase,
    pub action: String,
}

/// Session flow phase tracker.
///
/// Phase machine:
///   AWAITING_PERMISSION -> RECORDING(step)            (grant)
///   RECORDING(s) -> TRANSFERRING(s)                   (advance signal)
///   TRANSFERRING(s) -> RECORDING(s+1)                 (transfer ok, more steps)
///   TRANSFERRING(s) -> COMPLETED                      (transfer ok, last step)
///   TRANSFERRING(s) -> AWAITING_MANUAL_RETRY(s)       (transfer failed)
///   AWAITING_MANUAL_RETRY(s) -> TRANSFERRING(s)       (manual retry)
///
/// COMPLETED is terminal. The linear transitions are what guarantees step
/// n+1 never records before step n's transfer settled.
#[derive(Debug)]
pub struct SessionFlow {
    phase: SessionPhase,
}

impl SessionFlow {
    /// Create a new flow awaiting device permission
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::AwaitingPermission,
        }
    }

    /// Get the current phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Permission granted; start recording at the given step (0 for a
    /// fresh session, the persisted step when resuming).
    pub fn grant(&mut self, step: u32) -> Result<(), InvalidPhaseTransition> {
        if self.phase != SessionPhase::AwaitingPermission {
            return Err(self.invalid("grant permission"));
        }
        self.phase = SessionPhase::Recording(step);
        Ok(())
    }

    /// Advance signal received; the span is finalized and handed to the
    /// transfer client.
    pub fn begin_transfer(&mut self) -> Result<u32, InvalidPhaseTransition> {
        match self.phase {
            SessionPhase::Recording(step) => {
                self.phase = SessionPhase::Transferring(step);
                Ok(step)
            }
            _ => Err(self.invalid("begin transfer")),
        }
    }

    /// Transfer succeeded; move to the next step or complete the session.
    pub fn transfer_succeeded(&mut self, step_count: u32) -> Result<(), InvalidPhaseTransition> {
        match self.phase {
            SessionPhase::Transferring(step) => {
                let next = step + 1;
                self.phase = if next >= step_count {
                    SessionPhase::Completed
                } else {
                    SessionPhase::Recording(next)
                };
                Ok(())
            }
            _ => Err(self.invalid("record transfer success")),
        }
    }

    /// Transfer failed past the automatic budget (or with a client
    /// error); the same blob is retained for a manual retry.
    pub fn transfer_failed(&mut self) -> Result<(), InvalidPhaseTransition> {
        match self.phase {
            SessionPhase::Transferring(step) => {
                self.phase = SessionPhase::AwaitingManualRetry(step);
                Ok(())
            }
            _ => Err(self.invalid("record transfer failure")),
        }
    }

    /// User chose to retry; re-enter transfer with a fresh budget.
    pub fn manual_retry(&mut self) -> Result<u32, InvalidPhaseTransition> {
        match self.phase {
            SessionPhase::AwaitingManualRetry(step) => {
                self.phase = SessionPhase::Transferring(step);
                Ok(step)
            }
            _ => Err(self.invalid("manually retry")),
        }
    }

    fn invalid(&self, action: &str) -> InvalidPhaseTransition {
        InvalidPhaseTransition {
            current_phase: self.phase,
            action: action.to_string(),
        }
    }
}

impl Default for SessionFlow {
    fn default() -> Self {
        Self::new()
    }
}
