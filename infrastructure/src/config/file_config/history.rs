//! Debate history configuration from TOML (`[history]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Save a snapshot of every finished debate
    pub enabled: bool,
    /// Snapshot directory (default: `$XDG_DATA_HOME/debate-console/history`)
    pub dir: Option<PathBuf>,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl FileHistoryConfig {
    /// Directory snapshots are written to, if one can be determined
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("debate-console").join("history"))
        })
    }
}
