//! Project snapshot model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectLoadError {
    #[error("cannot read project file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed project file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn default_fps() -> f64 {
    30.0
}

fn default_volume() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Position on the timeline, seconds
    #[serde(default)]
    pub start: f64,
    /// Seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub track: u32,
    /// Linear gain, 1.0 is unity
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Clip {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub duration: f64,
}

/// Immutable view of the edited project shared by all analysis tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl ProjectSnapshot {
    pub fn load(path: &Path) -> Result<Self, ProjectLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProjectLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ProjectLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Track numbers in ascending order
    pub fn tracks(&self) -> Vec<u32> {
        self.clips
            .iter()
            .map(|c| c.track)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Clips ordered by start time, then track
    pub fn timeline(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().collect();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.track.cmp(&b.track)));
        clips
    }

    /// End of the last clip, seconds
    pub fn runtime(&self) -> f64 {
        self.clips.iter().map(Clip::end).fold(0.0, f64::max)
    }
}
