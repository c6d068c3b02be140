//! HTTP collector client adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    CollectorClient, FinalizeError, SegmentPayload, UploadError, UploadReceipt,
};

/// Upload endpoint path
const UPLOAD_PATH: &str = "/api/upload-one";

/// Finalize endpoint path
const FINISH_PATH: &str = "/api/session/finish";

// Wire types for the collector API

#[derive(Debug, Deserialize)]
struct UploadAck {
    #[serde(rename = "savedAs")]
    saved_as: Option<String>,
}

#[derive(Debug, Serialize)]
struct FinishRequest<'a> {
    token: &'a str,
    folder: &'a str,
    #[serde(rename = "questionsCount")]
    questions_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    detail: Option<String>,
}

/// Collector client over HTTP.
///
/// Classifies every outcome at this boundary: 2xx success, 4xx rejected
/// (non-retriable), 5xx or connection failure transient. Any unexpected
/// status is treated as transient.
pub struct HttpCollector {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCollector {
    /// Create a new collector client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Build the upload endpoint URL
    fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, UPLOAD_PATH)
    }

    /// Build the finalize endpoint URL
    fn finish_url(&self) -> String {
        format!("{}{}", self.base_url, FINISH_PATH)
    }

    /// Extract a human-readable message from an error body.
    /// The collector sends `{"detail": "..."}`; fall back to raw text.
    fn error_message(status: u16, body: &str) -> String {
        serde_json::from_str::<ApiError>(body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                }
            })
    }

    fn build_form(payload: &SegmentPayload) -> Form {
        let part = Part::bytes(payload.segment.data().to_vec())
            .file_name(payload.file_name.clone())
            .mime_str(payload.segment.encoding().as_str())
            .unwrap_or_else(|_| Part::bytes(payload.segment.data().to_vec()));

        Form::new()
            .text("token", payload.token.clone())
            .text("folder", payload.folder.clone())
            .text("questionIndex", payload.question_index.to_string())
            .part("video", part)
    }
}

#[async_trait]
impl CollectorClient for HttpCollector {
    async fn upload_segment(
        &self,
        payload: &SegmentPayload,
    ) -> Result<UploadReceipt, UploadError> {
        let response = self
            .client
            .post(self.upload_url())
            .multipart(Self::build_form(payload))
            .send()
            .await
            .map_err(|e| UploadError::Transient {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.is_success() {
            // A receipt body is nice to have, not load-bearing
            let saved_as = response
                .json::<UploadAck>()
                .await
                .ok()
                .and_then(|ack| ack.saved_as);
            return Ok(UploadReceipt { saved_as });
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = Self::error_message(status_code, &body);

        if status.is_client_error() {
            return Err(UploadError::Rejected {
                status: status_code,
                message,
            });
        }

        Err(UploadError::Transient {
            status: Some(status_code),
            message,
        })
    }

    async fn finalize(
        &self,
        token: &str,
        folder: &str,
        questions_count: u32,
    ) -> Result<(), FinalizeError> {
        let body = FinishRequest {
            token,
            folder,
            questions_count,
        };

        let response = self
            .client
            .post(self.finish_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| FinalizeError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FinalizeError {
                message: Self::error_message(status.as_u16(), &body),
            });
        }

        Ok(())
    }
}
