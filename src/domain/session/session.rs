//! Session entity and its persisted form

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error advancing a session past its last step
#[derive(Debug, Clone, Error)]
#[error("Session already completed all {step_count} steps")]
pub struct SessionComplete {
    pub step_count: u32,
}

/// Persisted session record.
///
/// Written after every successful step transfer, read at startup to
/// resume, cleared only on successful finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_step: u32,
    pub identity_token: String,
    pub destination_folder: String,
}

/// The overall recording flow instance.
///
/// Invariant: `0 <= current_step <= step_count`; the step counter only
/// moves forward, one step at a time, and only the session flow advances
/// it after a successful transfer.
#[derive(Debug, Clone)]
pub struct Session {
    step_count: u32,
    current_step: u32,
    identity_token: String,
    destination_folder: String,
}

impl Session {
    /// Start a fresh session at step 0
    pub fn new(
        step_count: u32,
        identity_token: impl Into<String>,
        destination_folder: impl Into<String>,
    ) -> Self {
        Self {
            step_count,
            current_step: 0,
            identity_token: identity_token.into(),
            destination_folder: destination_folder.into(),
        }
    }

    /// Resume a session from its persisted record.
    /// A persisted step beyond the configured count is clamped to the
    /// count, which lands the session directly in finalization.
    pub fn resume(state: SessionState, step_count: u32) -> Self {
        Self {
            step_count,
            current_step: state.current_step.min(step_count),
            identity_token: state.identity_token,
            destination_folder: state.destination_folder,
        }
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    pub fn destination_folder(&self) -> &str {
        &self.destination_folder
    }

    /// The 1-indexed step number used on the wire
    pub fn question_index(&self) -> u32 {
        self.current_step + 1
    }

    /// True once every step has been transferred
    pub fn is_complete(&self) -> bool {
        self.current_step >= self.step_count
    }

    /// Move to the next step. Only called after a successful transfer of
    /// the current step's segment.
    pub fn advance(&mut self) -> Result<(), SessionComplete> {
        if self.is_complete() {
            return Err(SessionComplete {
                step_count: self.step_count,
            });
        }
        self.current_step += 1;
        Ok(())
    }

    /// Snapshot for persistence
    pub fn to_state(&self) -> SessionState {
        SessionState {
            current_step: self.current_step,
            identity_token: self.identity_token.clone(),
            destination_folder: self.destination_folder.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_at_zero() {
        let session = Session::new(5, "tok", "folder");
        assert_eq!(session.current_step(), 0);
        assert_eq!(session.question_index(), 1);
        assert!(!session.is_complete());
    }

    #[test]
    fn advance_increments_by_one() {
        let mut session = Session::new(5, "tok", "folder");
        session.advance().unwrap();
        assert_eq!(session.current_step(), 1);
        session.advance().unwrap();
        assert_eq!(session.current_step(), 2);
    }

    #[test]
    fn complete_after_all_steps() {
        let mut session = Session::new(2, "tok", "folder");
        session.advance().unwrap();
        session.advance().unwrap();
        assert!(session.is_complete());
    }

    #[test]
    fn advance_past_end_fails() {
        let mut session = Session::new(1, "tok", "folder");
        session.advance().unwrap();

        let err = session.advance().unwrap_err();
        assert_eq!(err.step_count, 1);
        assert_eq!(session.current_step(), 1);
    }

    #[test]
    fn resume_restores_step() {
        let state = SessionState {
            current_step: 3,
            identity_token: "tok".into(),
            destination_folder: "folder".into(),
        };
        let session = Session::resume(state, 5);
        assert_eq!(session.current_step(), 3);
        assert_eq!(session.identity_token(), "tok");
        assert!(!session.is_complete());
    }

    #[test]
    fn resume_clamps_out_of_range_step() {
        let state = SessionState {
            current_step: 9,
            identity_token: "tok".into(),
            destination_folder: "folder".into(),
        };
        let session = Session::resume(state, 5);
        assert_eq!(session.current_step(), 5);
        assert!(session.is_complete());
    }

    #[test]
    fn state_round_trips() {
        let mut session = Session::new(5, "tok", "folder");
        session.advance().unwrap();

        let state = session.to_state();
        assert_eq!(state.current_step, 1);

        let resumed = Session::resume(state, 5);
        assert_eq!(resumed.current_step(), 1);
        assert_eq!(resumed.destination_folder(), "folder");
    }

    #[test]
    fn state_serializes_to_json() {
        let state = SessionState {
            current_step: 2,
            identity_token: "abc".into(),
            destination_folder: "f1".into(),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
