//! Director definitions.
//!
//! A director is an analysis persona. Definitions are loaded once at startup
//! and never change afterwards; a run receives the selected directors by value.

pub mod entities;
pub mod roster;

pub use entities::{Director, DirectorPersonality, DirectorValidationError};
pub use roster::DirectorRoster;
