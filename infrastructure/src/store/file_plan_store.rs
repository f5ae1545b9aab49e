//! One JSON document per run, written atomically.
//!
//! A save serializes the record into a temporary file in the store
//! directory, syncs it, then links it into place under `<run_id>.json`
//! without overwriting. A crash before the link leaves only a stray
//! temporary file, which `list` ignores.

use council_application::{PersistenceError, PlanStore};
use council_domain::{PlanRecord, PlanSummary};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FilePlanStore {
    dir: PathBuf,
}

impl FilePlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `run_id`, or `None` if the id could escape
    /// the store directory.
    fn record_path(&self, run_id: &str) -> Option<PathBuf> {
        let valid = !run_id.is_empty()
            && run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{run_id}.{RECORD_EXTENSION}")))
    }

    fn read_record(path: &Path, run_id: &str) -> Result<PlanRecord, PersistenceError> {
        let corrupt = |reason: String| PersistenceError::Corrupt {
            run_id: run_id.to_string(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PersistenceError::NotFound(run_id.to_string()),
            _ => corrupt(e.to_string()),
        })?;
        let record: PlanRecord =
            serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

        if record.run_id != run_id {
            return Err(corrupt(format!(
                "file holds run '{}' instead",
                record.run_id
            )));
        }
        record
            .plan
            .validate()
            .map_err(|e| corrupt(e.to_string()))?;
        record.graph.validate().map_err(|e| corrupt(e.to_string()))?;
        Ok(record)
    }

    /// Fsync the directory so the new link survives a crash.
    fn sync_dir(&self) -> std::io::Result<()> {
        File::open(&self.dir)?.sync_all()
    }
}

impl PlanStore for FilePlanStore {
    fn save(&self, record: &PlanRecord) -> Result<(), PersistenceError> {
        let path = self.record_path(&record.run_id).ok_or_else(|| {
            PersistenceError::WriteError(format!("invalid run id '{}'", record.run_id))
        })?;
        let write_err = |e: std::io::Error| PersistenceError::WriteError(e.to_string());

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| PersistenceError::WriteError(e.to_string()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".plan-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        tmp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                PersistenceError::WriteError(format!(
                    "a record for run '{}' already exists",
                    record.run_id
                ))
            } else {
                PersistenceError::WriteError(e.error.to_string())
            }
        })?;
        // The record is already linked in; a failed sync only weakens durability.
        if let Err(e) = self.sync_dir() {
            warn!(run_id = %record.run_id, dir = %self.dir.display(), "Plan saved but directory sync failed: {}", e);
        }

        info!(run_id = %record.run_id, path = %path.display(), "Plan saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<PlanSummary>, PersistenceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::WriteError(e.to_string())),
        };

        let mut summaries = Vec::new();
        for path in entries.filter_map(|e| e.ok().map(|e| e.path())) {
            if path.extension().is_none_or(|ext| ext != RECORD_EXTENSION) {
                continue;
            }
            let Some(run_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Self::read_record(&path, run_id) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable plan record: {}", e),
            }
        }

        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        debug!(count = summaries.len(), "Listed plan records");
        Ok(summaries)
    }

    fn load(&self, run_id: &str) -> Result<PlanRecord, PersistenceError> {
        let path = self
            .record_path(run_id)
            .ok_or_else(|| PersistenceError::NotFound(run_id.to_string()))?;
        Self::read_record(&path, run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use council_domain::{
        BranchKey, DebateMessage, InvocationId, MessageType, Plan, PlanGraphBuilder, RankedStep,
        ReportStatus, RunEvent, Step, StepType,
    };

    fn record(run_id: &str, minutes_ago: i64) -> PlanRecord {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        let branch = BranchKey::new("pacing");
        let mut builder = PlanGraphBuilder::new(run_id, "tighten the edit");
        let events = [
            RunEvent::BranchStarted {
                branch: branch.clone(),
                director_id: "pacing".to_string(),
                label: "Pacing".to_string(),
                description: "rhythm".to_string(),
            },
            RunEvent::StepStarted {
                invocation: InvocationId(1),
                branch: Some(branch.clone()),
                tool_name: "analyze_pacing".to_string(),
                arguments: serde_json::json!({"window": 0.25}),
            },
            RunEvent::StepCompleted {
                invocation: InvocationId(1),
                result: "{\"average_shot\":2.5}".to_string(),
            },
            RunEvent::BranchEnded {
                branch,
                status: ReportStatus::Complete,
                note: String::new(),
            },
        ];
        for event in &events {
            builder.apply(event).unwrap();
        }

        let step = Step::new(
            "pacing-r0-s1",
            "pacing",
            StepType::Transition,
            "add fade between clip1/clip2",
            0.7,
        )
        .with_rationale("hard cut is jarring");
        let plan = Plan {
            plan_id: format!("plan-{run_id}"),
            title: "Smoother transitions".to_string(),
            created_by: vec!["pacing".to_string()],
            confidence: 0.7,
            summary: "One fade".to_string(),
            steps: vec![RankedStep {
                step,
                confidence: 0.7,
                corroborated_by: vec!["pacing".to_string()],
                round: 0,
                agent_index: 0,
                depends_on: Vec::new(),
            }],
            debate_transcript: vec![DebateMessage::new(
                0,
                "pacing",
                "Pacing",
                MessageType::Analysis,
                "cuts are abrupt",
            )],
            excluded: Vec::new(),
            created_at,
        };

        PlanRecord {
            run_id: run_id.to_string(),
            prompt: "tighten the edit".to_string(),
            created_at,
            plan,
            graph: builder.finalize(),
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(dir.path());
        let original = record("run-1", 0);

        store.save(&original).unwrap();
        let loaded = store.load("run-1").unwrap();

        assert_eq!(loaded, original);
        assert!(loaded.graph.finalized);
    }

    #[test]
    fn test_save_creates_directory_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(dir.path().join("nested").join("plans"));

        store.save(&record("run-1", 0)).unwrap();
        let err = store.save(&record("run-1", 0)).unwrap_err();
        assert!(matches!(err, PersistenceError::WriteError(_)));

        // No temporary files left behind
        let names: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["run-1.json".to_string()]);
    }

    #[test]
    fn test_list_orders_by_recency_and_skips_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(dir.path());
        store.save(&record("old", 30)).unwrap();
        store.save(&record("new", 1)).unwrap();
        store.save(&record("middle", 10)).unwrap();
        fs::write(dir.path().join("broken.json"), "{ truncated").unwrap();
        fs::write(dir.path().join(".plan-abc.tmp"), "partial").unwrap();

        let ids: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|s| s.run_id)
            .collect();
        assert_eq!(ids, vec!["new", "middle", "old"]);
    }

    #[test]
    fn test_sync_dir_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FilePlanStore::new(dir.path()).sync_dir().is_ok());

        let gone = FilePlanStore::new(dir.path().join("gone"));
        assert_eq!(gone.sync_dir().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(dir.path().join("none"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(dir.path());

        assert_eq!(
            store.load("missing"),
            Err(PersistenceError::NotFound("missing".to_string()))
        );
        assert!(matches!(
            store.load("../escape"),
            Err(PersistenceError::NotFound(_))
        ));

        fs::write(dir.path().join("broken.json"), "{ truncated").unwrap();
        assert!(matches!(
            store.load("broken"),
            Err(PersistenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_rejects_broken_graph() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(dir.path());
        let mut bad = record("run-2", 0);
        bad.graph.nodes.swap(0, 1);
        fs::write(
            dir.path().join("run-2.json"),
            serde_json::to_vec(&bad).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            store.load("run-2"),
            Err(PersistenceError::Corrupt { .. })
        ));
    }
}
