//! Persisted session state port interface

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::session::SessionState;

/// Errors from the session state store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Failed to read session state: {0}")]
    ReadError(String),

    #[error("Failed to parse session state: {0}")]
    ParseError(String),

    #[error("Failed to write session state: {0}")]
    WriteError(String),
}

/// Port for the persisted session record.
///
/// Any key-value medium can satisfy this: a file, an embedded database,
/// a remote store. The flow reads it at startup to resume, writes it
/// after every successful step, and clears it on finalization.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted state, `None` when no session is stored
    async fn load(&self) -> Result<Option<SessionState>, StoreError>;

    /// Persist the given state, replacing any previous record
    async fn save(&self, state: &SessionState) -> Result<(), StoreError>;

    /// Remove the persisted record. Idempotent.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Where the state lives, for diagnostics
    fn path(&self) -> PathBuf;
}
