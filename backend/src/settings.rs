use std::path::{Path, PathBuf};

use shared::error::{Error, ErrorCode, Result};
use shared::models::DesignOptions;

use crate::local::io_error;

/// Fixed storage name for the JSON-encoded design preferences.
pub const SETTINGS_FILE: &str = "poll-app-design.json";

/// Locally persisted presentation preferences, independent of poll data.
#[derive(Debug, Clone)]
pub struct DesignStore {
    path: PathBuf,
}

impl DesignStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    /// A missing or unreadable settings file falls back to the defaults.
    pub fn load(&self) -> DesignOptions {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, design: &DesignOptions) -> Result<()> {
        let data = serde_json::to_string(design).map_err(|e| {
            Error::with_details(ErrorCode::Transient, "Failed to encode design settings", e.to_string())
        })?;
        std::fs::write(&self.path, data).map_err(io_error)
    }
}
