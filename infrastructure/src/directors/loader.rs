//! File system director source
//!
//! Directories are scanned in the order given (built-in first, then user).
//! Inside a directory, files are visited in lexical order so that the
//! "first occurrence wins" rule is deterministic.

use council_application::{DirectorSource, DirectorSourceError};
use council_domain::{Director, DirectorRoster, DirectorValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Extension of director definition files
pub const DIRECTOR_EXTENSION: &str = "director";

/// Why a single definition file was skipped.
#[derive(Error, Debug)]
pub enum DirectorLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed director file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid director in {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: DirectorValidationError,
    },
}

/// Loads directors from one or more directories of `.director` files.
#[derive(Debug, Clone, Default)]
pub struct FileDirectorSource {
    dirs: Vec<PathBuf>,
}

impl FileDirectorSource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Parse and validate one definition file.
    pub fn load_file(path: &Path) -> Result<Director, DirectorLoadError> {
        let content = fs::read_to_string(path).map_err(|source| DirectorLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let director: Director =
            serde_json::from_str(&content).map_err(|source| DirectorLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        director
            .validate()
            .map_err(|source| DirectorLoadError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(director)
    }

    /// `.director` files of `dir` in lexical order. A missing directory is empty.
    fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, DirectorSourceError> {
        if !dir.exists() {
            debug!("Director directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir).map_err(|e| DirectorSourceError::Unreadable {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == DIRECTOR_EXTENSION)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl DirectorSource for FileDirectorSource {
    fn load(&self) -> Result<DirectorRoster, DirectorSourceError> {
        let mut roster = DirectorRoster::new();

        for dir in &self.dirs {
            for path in Self::definition_files(dir)? {
                match Self::load_file(&path) {
                    Ok(director) => {
                        let id = director.id.clone();
                        if roster.insert(director) {
                            debug!(director = %id, path = %path.display(), "Loaded director");
                        } else {
                            warn!(
                                director = %id,
                                path = %path.display(),
                                "Duplicate director id, keeping the first definition"
                            );
                        }
                    }
                    Err(e) => warn!("Skipping director file: {}", e),
                }
            }
        }

        info!(count = roster.len(), "Directors loaded");
        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: &str, name: &str) -> String {
        serde_json::json!({
            "id": id,
            "name": name,
            "author": "Council",
            "description": format!("{name} reviews the edit"),
            "tags": ["pacing"],
            "personality": {
                "system_prompt": "You are a meticulous film editor.",
                "analysis_focus": ["rhythm"],
                "expertise_areas": ["cutting"]
            }
        })
        .to_string()
    }

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_load_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pacing.director", &definition("pacing", "Pacing"));

        let roster = FileDirectorSource::new(vec![dir.path().to_path_buf()])
            .load()
            .unwrap();
        let director = roster.get("pacing").unwrap();
        assert_eq!(director.version, "1.0.0");
        assert_eq!(director.personality.critique_style, "constructive");
        assert_eq!(director.expertise(), ["cutting".to_string()]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_occurrence() {
        let builtin = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        write(builtin.path(), "a.director", &definition("pacing", "First"));
        write(builtin.path(), "b.director", &definition("pacing", "Second"));
        write(user.path(), "a.director", &definition("pacing", "User"));
        write(user.path(), "c.director", &definition("audio", "Audio"));

        let roster = FileDirectorSource::new(vec![
            builtin.path().to_path_buf(),
            user.path().to_path_buf(),
        ])
        .load()
        .unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("pacing").unwrap().name, "First");
        assert!(roster.contains("audio"));

        // Loading again yields the same roster
        let again = FileDirectorSource::new(vec![
            builtin.path().to_path_buf(),
            user.path().to_path_buf(),
        ])
        .load()
        .unwrap();
        assert_eq!(again.get("pacing").unwrap().name, "First");
    }

    #[test]
    fn test_malformed_and_invalid_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.director", "{ not json");
        write(dir.path(), "b.director", &definition("", "Nameless"));
        write(dir.path(), "c.director", &definition("has space", "Spacey"));
        write(dir.path(), "d.director", &definition("color", "Color"));
        write(dir.path(), "notes.txt", &definition("ignored", "Ignored"));

        let roster = FileDirectorSource::new(vec![dir.path().to_path_buf()])
            .load()
            .unwrap();
        assert_eq!(roster.len(), 1);
        assert!(roster.contains("color"));
    }

    #[test]
    fn test_load_file_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.director");
        fs::write(&path, "[]").unwrap();
        assert!(matches!(
            FileDirectorSource::load_file(&path),
            Err(DirectorLoadError::Parse { .. })
        ));
        assert!(matches!(
            FileDirectorSource::load_file(&dir.path().join("missing.director")),
            Err(DirectorLoadError::Io { .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let roster = FileDirectorSource::new(vec![dir.path().join("nope")])
            .load()
            .unwrap();
        assert!(roster.is_empty());
    }
}
