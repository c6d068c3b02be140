//! File-backed session state store

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{SessionStore, StoreError};
use crate::domain::session::SessionState;

/// Session store persisting a single JSON record in the XDG data dir.
///
/// The record outlives the process; that is the whole point. A missing
/// file means no session, not an error, and clearing twice is fine.
pub struct SessionFileStore {
    path: PathBuf,
}

impl SessionFileStore {
    /// Create a store at the default data-dir location
    pub fn new() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("vox-courier");

        Self {
            path: data_dir.join("session.json"),
        }
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for SessionFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for SessionFileStore {
    async fn load(&self) -> Result<Option<SessionState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::ReadError(e.to_string()))?;

        let state = serde_json::from_str(&content)
            .map_err(|e| StoreError::ParseError(e.to_string()))?;

        Ok(Some(state))
    }

    async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::WriteError(e.to_string()))?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::WriteError(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteError(e.to_string())),
        }
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}
