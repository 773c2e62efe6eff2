use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted sync metadata: the end of the last window that fully applied.
/// A missing or corrupt file reads as "never synced" — the run then falls
/// back to the lookback window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn load(path: &Path) -> SyncState {
        let Ok(text) = std::fs::read_to_string(path) else {
            return SyncState::default();
        };
        serde_json::from_str(&text).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, payload)
    }
}
