//! Director entity and its on-disk record shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_critique_style() -> String {
    "constructive".to_string()
}

/// How a director analyzes and critiques.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorPersonality {
    pub system_prompt: String,
    #[serde(default)]
    pub analysis_focus: Vec<String>,
    #[serde(default = "default_critique_style")]
    pub critique_style: String,
    #[serde(default)]
    pub expertise_areas: Vec<String>,
}

/// An analysis persona, deserialized directly from a `.director` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Director {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub author: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub personality: DirectorPersonality,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectorValidationError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("director id '{0}' may only contain letters, digits, '-' and '_'")]
    InvalidId(String),
}

impl Director {
    /// Check fields serde cannot: required strings must carry content.
    pub fn validate(&self) -> Result<(), DirectorValidationError> {
        let required = [
            ("id", &self.id),
            ("name", &self.name),
            ("author", &self.author),
            ("description", &self.description),
            ("personality.system_prompt", &self.personality.system_prompt),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DirectorValidationError::EmptyField(field));
            }
        }
        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DirectorValidationError::InvalidId(self.id.clone()));
        }
        Ok(())
    }

    /// Expertise list shown to users and injected in prompts
    pub fn expertise(&self) -> &[String] {
        &self.personality.expertise_areas
    }

    /// Full system prompt: persona plus identity, focus and critique style.
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.personality.system_prompt.trim().to_string();
        prompt.push_str(&format!(
            "\n\nYour name is {} and you are a {}.",
            self.name,
            self.description.trim_end_matches('.')
        ));
        if !self.personality.analysis_focus.is_empty() {
            prompt.push_str(&format!(
                "\nAnalysis focus: {}",
                self.personality.analysis_focus.join(", ")
            ));
        }
        if !self.personality.expertise_areas.is_empty() {
            prompt.push_str(&format!(
                "\nExpertise areas: {}",
                self.personality.expertise_areas.join(", ")
            ));
        }
        prompt.push_str(&format!(
            "\nCritique style: {}",
            self.personality.critique_style
        ));
        prompt
    }
}
