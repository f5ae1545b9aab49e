//! Read-only project inspection tools
//!
//! The CLI has no live editor, so the analysis tools work on a project
//! snapshot loaded from JSON:
//!
//! ```json
//! {"name": "Teaser", "fps": 30,
//!  "clips": [{"id": "c1", "name": "Intro", "start": 0.0, "duration": 2.5, "track": 1, "volume": 0.8}],
//!  "transitions": [{"type": "fade", "from": "c1", "to": "c2", "duration": 0.5}]}
//! ```
//!
//! | Tool | Reports |
//! |------|---------|
//! | `get_project_summary` | name, fps, tracks, clip and transition counts, runtime |
//! | `list_clips` | clips in timeline order, optionally for one track |
//! | `analyze_pacing` | shot length statistics and a pacing category |
//! | `analyze_audio_levels` | per-track volume, muted and clipping clips |
//! | `analyze_transitions` | transition counts by type, hard cuts |

mod snapshot;
mod tools;

pub use snapshot::{Clip, ProjectLoadError, ProjectSnapshot, Transition};
pub use tools::{
    AnalyzeAudioLevels, AnalyzePacing, AnalyzeTransitions, GetProjectSummary, ListClips,
    project_tool_registry,
};
