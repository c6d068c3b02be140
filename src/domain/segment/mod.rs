//! Segment domain: capture spans and finalized segment data

pub mod capture_span;
pub mod segment_data;

pub use capture_span::{CaptureSpan, InvalidSpanTransition, SpanState};
pub use segment_data::{SegmentData, SegmentEncoding};
