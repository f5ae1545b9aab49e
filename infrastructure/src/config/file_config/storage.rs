//! Plan store (`[store]`) and run event log (`[logging]`) sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Plan record directory (default: `<data dir>/director-council/plans`)
    pub dir: Option<PathBuf>,
}

impl FileStoreConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("director-council").join("plans"))
                .unwrap_or_else(|| PathBuf::from(".director-council").join("plans"))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL run event log; disabled when unset
    pub event_log: Option<PathBuf>,
}
