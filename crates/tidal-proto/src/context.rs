use crate::payload::{CatalogId, Payload};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The album of the most recently *started* track.  Survives pause, stop and
/// player exit; only the next track start replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackContext {
    pub id: CatalogId,
    pub name: String,
}

impl PlaybackContext {
    pub fn new(id: impl Into<CatalogId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn album_payload(&self) -> Payload {
        Payload::Album {
            album_id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("context I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("context file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sole owner of the context file.  Single writer, no locking.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort overwrite.  Callers usually ignore the result.
    pub fn save(&self, context: &PlaybackContext) -> Result<(), ContextError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(context)?;
        std::fs::write(&self.path, json)?;
        debug!("context: saved album {} ({})", context.id, context.name);
        Ok(())
    }

    pub fn try_load(&self) -> Result<PlaybackContext, ContextError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// `None` when the file is missing, unreadable or corrupt.
    pub fn load(&self) -> Option<PlaybackContext> {
        match self.try_load() {
            Ok(context) => Some(context),
            Err(e) => {
                debug!("context: none ({})", e);
                None
            }
        }
    }
}
