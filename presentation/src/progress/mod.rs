//! Progress reporting during a director run

pub mod reporter;
