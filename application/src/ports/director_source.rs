//! Director source port
//!
//! Where director definitions come from (definition files, a marketplace
//! cache, a test fixture). Loading happens once at startup.

use council_domain::DirectorRoster;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectorSourceError {
    #[error("Failed to read director directory {path}: {message}")]
    Unreadable { path: String, message: String },
}

pub trait DirectorSource: Send + Sync {
    /// Load every valid director. Malformed definitions are skipped, ids are
    /// deduplicated keeping the first occurrence.
    fn load(&self) -> Result<DirectorRoster, DirectorSourceError>;
}
