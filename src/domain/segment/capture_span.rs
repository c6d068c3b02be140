//! Capture span entity and its per-step recording state machine

use std::fmt;
use thiserror::Error;

/// Span states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpanState {
    #[default]
    Idle,
    Recording,
    Stopped,
    Finalized,
}

impl SpanState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for SpanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid span transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid span transition: cannot {action} while in {current_state} state")]
pub struct InvalidSpanTransition {
    pub current_state: SpanState,
    pub action: String,
}

/// One recording span for a single session step.
///
/// State machine:
///   IDLE -> RECORDING (start)
///   RECORDING -> STOPPED -> FINALIZED (end; the two transitions are atomic here)
///
/// Chunks are append-only while recording; zero-length chunks are filtered.
/// `end` on a non-recording span is a no-op, so a double stop neither adds
/// chunks nor fails.
#[derive(Debug)]
pub struct CaptureSpan {
    step_index: u32,
    chunks: Vec<Vec<u8>>,
    state: SpanState,
}

impl CaptureSpan {
    /// Create a new idle span for the given step
    pub fn new(step_index: u32) -> Self {
        Self {
            step_index,
            chunks: Vec::new(),
            state: SpanState::Idle,
        }
    }

    /// Get the step this span belongs to
    pub fn step_index(&self) -> u32 {
        self.step_index
    }

    /// Get the current state
    pub fn state(&self) -> SpanState {
        self.state
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.state == SpanState::Recording
    }

    /// Check if finalized
    pub fn is_finalized(&self) -> bool {
        self.state == SpanState::Finalized
    }

    /// Number of accumulated chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Transition from IDLE to RECORDING
    pub fn start(&mut self) -> Result<(), InvalidSpanTransition> {
        if self.state != SpanState::Idle {
            return Err(InvalidSpanTransition {
                current_state: self.state,
                action: "start recording".to_string(),
            });
        }
        self.state = SpanState::Recording;
        Ok(())
    }

    /// Append a chunk emitted by the capture source.
    /// Zero-length chunks are dropped; everything else is kept in arrival
    /// order. Chunks arriving outside the recording window are rejected.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<(), InvalidSpanTransition> {
        if self.state != SpanState::Recording {
            return Err(InvalidSpanTransition {
                current_state: self.state,
                action: "append chunk".to_string(),
            });
        }
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Stop the span: RECORDING -> STOPPED -> FINALIZED.
    /// Idempotent; calling on an already stopped or finalized span does
    /// nothing and returns false.
    pub fn end(&mut self) -> bool {
        if self.state != SpanState::Recording {
            return false;
        }
        self.state = SpanState::Stopped;
        self.state = SpanState::Finalized;
        true
    }

    /// Consume the finalized span into one immutable blob, chunks
    /// concatenated in arrival order.
    pub fn into_blob(self) -> Result<Vec<u8>, InvalidSpanTransition> {
        if self.state != SpanState::Finalized {
            return Err(InvalidSpanTransition {
                current_state: self.state,
                action: "take blob".to_string(),
            });
        }
        let total: usize = self.chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in self.chunks {
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_span_is_idle() {
        let span = CaptureSpan::new(0);
        assert_eq!(span.state(), SpanState::Idle);
        assert_eq!(span.step_index(), 0);
        assert!(!span.is_recording());
    }

    #[test]
    fn start_from_idle() {
        let mut span = CaptureSpan::new(1);
        assert!(span.start().is_ok());
        assert!(span.is_recording());
    }

    #[test]
    fn start_twice_fails() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();

        let err = span.start().unwrap_err();
        assert_eq!(err.current_state, SpanState::Recording);
    }

    #[test]
    fn chunks_kept_in_arrival_order() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();
        span.push_chunk(vec![1, 2]).unwrap();
        span.push_chunk(vec![3]).unwrap();
        span.end();

        let blob = span.into_blob().unwrap();
        assert_eq!(blob, vec![1, 2, 3]);
    }

    #[test]
    fn zero_length_chunks_filtered() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();
        span.push_chunk(vec![]).unwrap();
        span.push_chunk(vec![7]).unwrap();
        span.push_chunk(vec![]).unwrap();

        assert_eq!(span.chunk_count(), 1);
    }

    #[test]
    fn push_chunk_while_idle_fails() {
        let mut span = CaptureSpan::new(0);
        let err = span.push_chunk(vec![1]).unwrap_err();
        assert_eq!(err.current_state, SpanState::Idle);
    }

    #[test]
    fn end_finalizes() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();
        assert!(span.end());
        assert!(span.is_finalized());
    }

    #[test]
    fn end_is_idempotent() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();
        span.push_chunk(vec![9]).unwrap();

        assert!(span.end());
        let chunks_after_first_end = span.chunk_count();
        assert!(!span.end());
        assert!(!span.end());
        assert_eq!(span.chunk_count(), chunks_after_first_end);
        assert!(span.is_finalized());
    }

    #[test]
    fn end_before_start_is_noop() {
        let mut span = CaptureSpan::new(0);
        assert!(!span.end());
        assert_eq!(span.state(), SpanState::Idle);
    }

    #[test]
    fn no_chunks_after_end() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();
        span.end();

        let err = span.push_chunk(vec![1]).unwrap_err();
        assert_eq!(err.current_state, SpanState::Finalized);
    }

    #[test]
    fn into_blob_requires_finalized() {
        let mut span = CaptureSpan::new(0);
        span.start().unwrap();

        let err = span.into_blob().unwrap_err();
        assert_eq!(err.current_state, SpanState::Recording);
    }

    #[test]
    fn state_display() {
        assert_eq!(SpanState::Idle.to_string(), "idle");
        assert_eq!(SpanState::Recording.to_string(), "recording");
        assert_eq!(SpanState::Finalized.to_string(), "finalized");
    }
}
