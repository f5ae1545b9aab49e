//! Core domain concepts shared across all subdomains.
//!
//! - [`task::AnalysisTask`]: a validated task description handed to the directors
//! - [`string`]: truncation, previews and token similarity helpers

pub mod string;
pub mod task;
