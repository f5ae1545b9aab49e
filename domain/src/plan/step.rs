//! Proposed edit steps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a proposed edit.
///
/// Serialized as its tag string; unknown tags are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    EditTimeline,
    Trim,
    SplitClip,
    Transition,
    AdjustAudio,
    Effect,
    Caption,
    ReorderClips,
    AddMusic,
    AddVoice,
    RemoveClip,
    Other(String),
}

impl StepType {
    pub fn as_str(&self) -> &str {
        match self {
            StepType::EditTimeline => "edit_timeline",
            StepType::Trim => "trim",
            StepType::SplitClip => "split_clip",
            StepType::Transition => "transition",
            StepType::AdjustAudio => "adjust_audio",
            StepType::Effect => "effect",
            StepType::Caption => "caption",
            StepType::ReorderClips => "reorder_clips",
            StepType::AddMusic => "add_music",
            StepType::AddVoice => "add_voice",
            StepType::RemoveClip => "remove_clip",
            StepType::Other(tag) => tag,
        }
    }

    /// Parse a tag. Matching is case-insensitive and accepts a few aliases
    /// the models tend to produce.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "edit_timeline" | "edit" => StepType::EditTimeline,
            "trim" | "cut" => StepType::Trim,
            "split_clip" | "split" => StepType::SplitClip,
            "transition" | "add_transition" => StepType::Transition,
            "adjust_audio" | "audio" => StepType::AdjustAudio,
            "effect" | "add_effect" => StepType::Effect,
            "caption" | "title" | "add_caption" => StepType::Caption,
            "reorder_clips" | "reorder" => StepType::ReorderClips,
            "add_music" | "music" => StepType::AddMusic,
            "add_voice" | "voice" | "voiceover" => StepType::AddVoice,
            "remove_clip" | "remove" => StepType::RemoveClip,
            _ => StepType::Other(normalized),
        }
    }

    /// Guess a type from the words of a step description.
    pub fn infer(description: &str) -> Self {
        let text = description.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["split"]) {
            StepType::SplitClip
        } else if has(&["cut", "trim"]) {
            StepType::Trim
        } else if has(&["transition", "fade", "dissolve"]) {
            StepType::Transition
        } else if has(&["audio", "sound", "music", "volume"]) {
            StepType::AdjustAudio
        } else if has(&["effect", "filter", "color"]) {
            StepType::Effect
        } else if has(&["title", "caption", "subtitle", "text"]) {
            StepType::Caption
        } else if has(&["reorder", "move", "rearrange"]) {
            StepType::ReorderClips
        } else {
            StepType::EditTimeline
        }
    }
}

impl From<String> for StepType {
    fn from(tag: String) -> Self {
        StepType::from_tag(&tag)
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        step_type.as_str().to_string()
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An atomic proposed edit action. Never mutated after an agent produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Id of the proposing director
    pub director_id: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Ids of steps from the same report that must be applied first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Step {
    pub fn new(
        step_id: impl Into<String>,
        director_id: impl Into<String>,
        step_type: StepType,
        description: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            description: description.into(),
            step_type,
            director_id: director_id.into(),
            confidence: clamp_confidence(confidence),
            rationale: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// `{director_id}-r{round}-s{n}`, n counted from 1
pub fn step_id(director_id: &str, round: u32, index: usize) -> String {
    format!("{}-r{}-s{}", director_id, round, index + 1)
}

/// Clamp into [0, 1]; NaN becomes 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_tags() {
        assert_eq!(StepType::from_tag("Transition"), StepType::Transition);
        assert_eq!(StepType::from_tag("split clip"), StepType::SplitClip);
        assert_eq!(
            StepType::from_tag("color-grade"),
            StepType::Other("color_grade".to_string())
        );
        assert_eq!(StepType::Other("x".into()).as_str(), "x");
    }

    #[test]
    fn test_step_type_serde_as_string() {
        let json = serde_json::to_string(&StepType::AddMusic).unwrap();
        assert_eq!(json, "\"add_music\"");
        let parsed: StepType = serde_json::from_str("\"lut\"").unwrap();
        assert_eq!(parsed, StepType::Other("lut".to_string()));
    }

    #[test]
    fn test_infer_from_description() {
        assert_eq!(StepType::infer("Split the long interview clip"), StepType::SplitClip);
        assert_eq!(StepType::infer("Trim dead air at 0:42"), StepType::Trim);
        assert_eq!(StepType::infer("Add fade between clip1/clip2"), StepType::Transition);
        assert_eq!(StepType::infer("Lower the music volume"), StepType::AdjustAudio);
        assert_eq!(StepType::infer("Add title card"), StepType::Caption);
        assert_eq!(StepType::infer("Rearrange the b-roll"), StepType::ReorderClips);
        assert_eq!(StepType::infer("Make it pop"), StepType::EditTimeline);
    }

    #[test]
    fn test_step_confidence_clamped() {
        let step = Step::new("a-r0-s1", "a", StepType::Trim, "trim", 1.7);
        assert_eq!(step.confidence, 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_step_id_format() {
        assert_eq!(step_id("youtube", 2, 0), "youtube-r2-s1");
    }

    #[test]
    fn test_step_serializes_type_field() {
        let step = Step::new("a-r0-s1", "a", StepType::Caption, "add title card", 0.4);
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], "caption");
        assert!(value.get("rationale").is_none());
        assert!(value.get("dependencies").is_none());

        let back: Step = serde_json::from_value(value).unwrap();
        assert!(back.dependencies.is_empty());
    }
}
