//! Director source configuration (`[directors]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where `.director` files are read from.
///
/// The built-in directory is scanned before the user directory, so a
/// built-in director keeps its id when a user file reuses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDirectorsConfig {
    /// Directors shipped with the application (default: `./directors`)
    pub builtin_dir: PathBuf,
    /// User-installed directors (default: `<data dir>/director-council/directors`)
    pub user_dir: Option<PathBuf>,
    /// Director ids used when `run` is given no `--director`
    pub default_selection: Vec<String>,
}

impl Default for FileDirectorsConfig {
    fn default() -> Self {
        Self {
            builtin_dir: PathBuf::from("directors"),
            user_dir: None,
            default_selection: Vec::new(),
        }
    }
}

impl FileDirectorsConfig {
    pub fn resolved_user_dir(&self) -> Option<PathBuf> {
        self.user_dir.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("director-council").join("directors"))
        })
    }

    /// Directories in scan order
    pub fn scan_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.builtin_dir.clone()];
        if let Some(user) = self.resolved_user_dir()
            && user != self.builtin_dir
        {
            dirs.push(user);
        }
        dirs
    }
}
