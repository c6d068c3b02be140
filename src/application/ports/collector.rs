//! Collector service port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::segment::SegmentData;

/// One segment upload request.
///
/// The segment bytes are immutable; every attempt (automatic or manual)
/// resends exactly this payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPayload {
    pub token: String,
    pub folder: String,
    /// 1-indexed step number on the wire
    pub question_index: u32,
    pub file_name: String,
    pub segment: SegmentData,
}

impl SegmentPayload {
    pub fn new(
        token: impl Into<String>,
        folder: impl Into<String>,
        question_index: u32,
        segment: SegmentData,
    ) -> Self {
        let file_name = format!("Q{}.{}", question_index, segment.encoding().extension());
        Self {
            token: token.into(),
            folder: folder.into(),
            question_index,
            file_name,
            segment,
        }
    }
}

/// Acknowledgement from the collector for a stored segment
#[derive(Debug, Clone, Default)]
pub struct UploadReceipt {
    pub saved_as: Option<String>,
}

/// A single upload attempt's failure, classified at the adapter boundary.
/// The session flow never sees a raw transport error.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// 4xx: the request itself is bad (invalid token, payload too
    /// large). Repeating it unchanged cannot succeed, so it is never
    /// retried automatically.
    #[error("Collector rejected the upload (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// 5xx, connection failure, or any unclassified status. Worth
    /// retrying with backoff.
    #[error("Transient upload failure: {message}")]
    Transient { status: Option<u16>, message: String },
}

impl UploadError {
    /// True when automatic retry is allowed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Error finalizing the session. Surfaced to the user; the persisted
/// session is left intact so finalization can be retried later.
#[derive(Debug, Clone, Error)]
#[error("Failed to finalize the session: {message}")]
pub struct FinalizeError {
    pub message: String,
}

/// Port for the remote collector service
#[async_trait]
pub trait CollectorClient: Send + Sync {
    /// Upload one finalized segment. One call is one attempt; retry
    /// scheduling lives above this port.
    async fn upload_segment(&self, payload: &SegmentPayload)
        -> Result<UploadReceipt, UploadError>;

    /// Signal session completion to the collector
    async fn finalize(
        &self,
        token: &str,
        folder: &str,
        questions_count: u32,
    ) -> Result<(), FinalizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::segment::SegmentEncoding;

    #[test]
    fn payload_file_name_uses_question_index_and_extension() {
        let segment = SegmentData::new(vec![1, 2, 3], SegmentEncoding::Flac);
        let payload = SegmentPayload::new("tok", "folder", 3, segment);
        assert_eq!(payload.file_name, "Q3.flac");
    }

    #[test]
    fn rejected_is_not_transient() {
        let err = UploadError::Rejected {
            status: 401,
            message: "bad token".into(),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn transient_without_status_displays_message() {
        let err = UploadError::Transient {
            status: None,
            message: "connection refused".into(),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("connection refused"));
    }
}
