//! Plan store port
//!
//! Append-only catalogue of finished runs. A save is all-or-nothing: after a
//! crash either the full record is readable or no record exists.

use council_domain::{PlanRecord, PlanSummary};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Failed to write plan record: {0}")]
    WriteError(String),

    #[error("Plan record '{run_id}' is corrupt: {reason}")]
    Corrupt { run_id: String, reason: String },

    #[error("No plan record for run '{0}'")]
    NotFound(String),
}

/// Durable plan catalogue.
pub trait PlanStore: Send + Sync {
    /// Persist a finished run. Saving an existing run id is a write error.
    fn save(&self, record: &PlanRecord) -> Result<(), PersistenceError>;

    /// Summaries of all readable records, most recent first.
    fn list(&self) -> Result<Vec<PlanSummary>, PersistenceError>;

    fn load(&self, run_id: &str) -> Result<PlanRecord, PersistenceError>;
}
