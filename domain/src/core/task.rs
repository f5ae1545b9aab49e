//! Analysis task value object

use serde::{Deserialize, Serialize};

/// What the directors are asked to do ("analyze this project for pacing").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisTask {
    content: String,
}

impl AnalysisTask {
    /// Returns `None` if the content is empty or only whitespace.
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self {
                content: content.trim().to_string(),
            })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for AnalysisTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_trims_content() {
        let task = AnalysisTask::try_new("  tighten the intro \n").unwrap();
        assert_eq!(task.content(), "tighten the intro");
        assert_eq!(task.to_string(), "tighten the intro");
    }

    #[test]
    fn test_empty_task_rejected() {
        assert!(AnalysisTask::try_new("").is_none());
        assert!(AnalysisTask::try_new("   \t").is_none());
    }
}
