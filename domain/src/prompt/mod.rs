//! Prompt domain
//!
//! Templates for each stage of a director run: analysis, debate and synthesis.

mod template;

pub use template::{PeerPosition, PromptTemplate};
