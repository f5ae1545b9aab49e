//! Analysis tool bodies over a [`ProjectSnapshot`]

use super::snapshot::{Clip, ProjectSnapshot};
use council_domain::{RiskLevel, ToolDefinition, ToolError, ToolParameter, ToolRegistry, UiTool};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Volume at or below this is treated as muted
const MUTED_VOLUME: f64 = 0.01;
/// Volume above this risks clipping
const HOT_VOLUME: f64 = 1.0;
/// Track mean volumes further apart than this are reported as unbalanced
const TRACK_IMBALANCE: f64 = 0.5;

/// Registry holding every project tool over `snapshot`.
pub fn project_tool_registry(snapshot: Arc<ProjectSnapshot>) -> ToolRegistry {
    ToolRegistry::new()
        .register(GetProjectSummary::new(snapshot.clone()))
        .register(ListClips::new(snapshot.clone()))
        .register(AnalyzePacing::new(snapshot.clone()))
        .register(AnalyzeAudioLevels::new(snapshot.clone()))
        .register(AnalyzeTransitions::new(snapshot))
}

fn track_param() -> ToolParameter {
    ToolParameter::new("track", "Only consider clips on this track", false).with_type("integer")
}

/// Optional `track` filter from the arguments.
fn track_filter(args: &Value) -> Result<Option<u32>, ToolError> {
    match args.get("track") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|t| u32::try_from(t).ok())
            .map(Some)
            .ok_or_else(|| ToolError::invalid_args("'track' must be a non-negative integer")),
    }
}

fn clips_on<'a>(snapshot: &'a ProjectSnapshot, track: Option<u32>) -> Vec<&'a Clip> {
    snapshot
        .timeline()
        .into_iter()
        .filter(|c| track.is_none_or(|t| c.track == t))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

macro_rules! snapshot_tool {
    ($name:ident) => {
        pub struct $name {
            snapshot: Arc<ProjectSnapshot>,
        }

        impl $name {
            pub fn new(snapshot: Arc<ProjectSnapshot>) -> Self {
                Self { snapshot }
            }
        }
    };
}

snapshot_tool!(GetProjectSummary);
snapshot_tool!(ListClips);
snapshot_tool!(AnalyzePacing);
snapshot_tool!(AnalyzeAudioLevels);
snapshot_tool!(AnalyzeTransitions);

impl UiTool for GetProjectSummary {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_project_summary",
            "Project name, frame rate, tracks, clip and transition counts, total runtime",
            RiskLevel::Low,
        )
    }

    fn invoke(&self, _args: &Value) -> Result<Value, ToolError> {
        let s = &self.snapshot;
        Ok(json!({
            "name": s.name,
            "fps": s.fps,
            "tracks": s.tracks(),
            "clip_count": s.clips.len(),
            "transition_count": s.transitions.len(),
            "runtime_seconds": round2(s.runtime()),
        }))
    }
}

impl UiTool for ListClips {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_clips",
            "Clips in timeline order with start, duration, track and volume",
            RiskLevel::Low,
        )
        .with_parameter(track_param())
    }

    fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let track = track_filter(args)?;
        let clips = clips_on(&self.snapshot, track);
        Ok(json!({ "clips": clips }))
    }
}

impl AnalyzePacing {
    fn category(average: f64) -> &'static str {
        match average {
            a if a < 2.0 => "very_fast",
            a if a < 4.0 => "fast",
            a if a < 6.0 => "moderate",
            a if a < 10.0 => "slow",
            _ => "very_slow",
        }
    }
}

impl UiTool for AnalyzePacing {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "analyze_pacing",
            "Shot length statistics (average, shortest, longest, cuts per minute) and a pacing category",
            RiskLevel::Low,
        )
        .with_parameter(track_param())
    }

    fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let track = track_filter(args)?;
        let clips = clips_on(&self.snapshot, track);
        let durations: Vec<f64> = clips
            .iter()
            .map(|c| c.duration)
            .filter(|d| *d > 0.0)
            .collect();

        if durations.is_empty() {
            return Ok(json!({ "clip_count": 0, "message": "No clips to analyze" }));
        }

        let average = durations.iter().sum::<f64>() / durations.len() as f64;
        let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let longest = durations.iter().copied().fold(0.0, f64::max);
        let shortest_clip = clips
            .iter()
            .find(|c| c.duration == shortest)
            .map(|c| c.id.clone());
        let longest_clip = clips
            .iter()
            .find(|c| c.duration == longest)
            .map(|c| c.id.clone());

        Ok(json!({
            "clip_count": durations.len(),
            "average_seconds": round2(average),
            "shortest_seconds": round2(shortest),
            "shortest_clip": shortest_clip,
            "longest_seconds": round2(longest),
            "longest_clip": longest_clip,
            "cuts_per_minute": round2(60.0 / average),
            "category": Self::category(average),
        }))
    }
}

impl UiTool for AnalyzeAudioLevels {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "analyze_audio_levels",
            "Per-track clip volume, muted clips, clips above unity gain and track imbalance",
            RiskLevel::Low,
        )
        .with_parameter(track_param())
    }

    fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let track = track_filter(args)?;
        let clips = clips_on(&self.snapshot, track);

        let mut by_track: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for clip in &clips {
            by_track.entry(clip.track).or_default().push(clip.volume);
        }

        let tracks: Vec<Value> = by_track
            .iter()
            .map(|(track, volumes)| {
                let mean = volumes.iter().sum::<f64>() / volumes.len() as f64;
                let peak = volumes.iter().copied().fold(0.0, f64::max);
                json!({
                    "track": track,
                    "clip_count": volumes.len(),
                    "mean_volume": round2(mean),
                    "peak_volume": round2(peak),
                })
            })
            .collect();

        let muted: Vec<&str> = clips
            .iter()
            .filter(|c| c.volume <= MUTED_VOLUME)
            .map(|c| c.id.as_str())
            .collect();
        let hot: Vec<&str> = clips
            .iter()
            .filter(|c| c.volume > HOT_VOLUME)
            .map(|c| c.id.as_str())
            .collect();

        let means: Vec<f64> = by_track
            .values()
            .map(|v| v.iter().sum::<f64>() / v.len() as f64)
            .collect();
        let spread = match (
            means.iter().copied().reduce(f64::min),
            means.iter().copied().reduce(f64::max),
        ) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0.0,
        };

        Ok(json!({
            "tracks": tracks,
            "muted_clips": muted,
            "clipping_risk": hot,
            "unbalanced": spread > TRACK_IMBALANCE,
        }))
    }
}

impl UiTool for AnalyzeTransitions {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "analyze_transitions",
            "Transition counts by type and adjacent clips joined by a hard cut",
            RiskLevel::Low,
        )
    }

    fn invoke(&self, _args: &Value) -> Result<Value, ToolError> {
        let s = &self.snapshot;
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        for transition in &s.transitions {
            let kind = if transition.kind.is_empty() {
                "unknown".to_string()
            } else {
                transition.kind.clone()
            };
            *by_type.entry(kind).or_default() += 1;
        }

        // Consecutive clips on the same track with no transition between them
        let mut hard_cuts = Vec::new();
        for track in s.tracks() {
            let clips = clips_on(s, Some(track));
            for pair in clips.windows(2) {
                let (a, b) = (&pair[0].id, &pair[1].id);
                let joined = s.transitions.iter().any(|t| {
                    t.from.as_deref() == Some(a.as_str()) && t.to.as_deref() == Some(b.as_str())
                });
                if !joined {
                    hard_cuts.push(json!({ "from": a, "to": b, "track": track }));
                }
            }
        }

        Ok(json!({
            "transition_count": s.transitions.len(),
            "by_type": by_type,
            "hard_cuts": hard_cuts,
        }))
    }
}
