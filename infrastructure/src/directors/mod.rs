//! Director definition loading
//!
//! Reads `.director` JSON files into a [`DirectorRoster`](council_domain::DirectorRoster).

mod loader;

pub use loader::{DIRECTOR_EXTENSION, DirectorLoadError, FileDirectorSource};
