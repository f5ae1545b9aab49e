//! Report and debate reply parsing from model text.
//!
//! Both formats are JSON, either inside a tagged fenced block
//! (` ```report `, ` ```debate `), a ` ```json ` block, or as the raw response.
//! Pure text handling, no I/O.

use serde_json::Value;

use super::debate::MessageType;
use super::step::{Step, StepType, clamp_confidence, step_id};

/// Structured content of an agent's final answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    pub summary: String,
    pub confidence: f64,
    pub steps: Vec<Step>,
}

/// Structured content of one debate reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DebateReply {
    pub message_type: MessageType,
    pub content: String,
    /// Present when the director revised its step list
    pub steps: Option<Vec<Step>>,
}

/// Title and summary written by the synthesis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisReply {
    pub title: String,
    pub summary: String,
}

const DEFAULT_REPORT_CONFIDENCE: f64 = 0.5;

/// Body of the first ` ```<tag> ` fenced block, if any.
pub fn extract_fenced_block<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let opener = format!("```{}", tag);
    let mut offset = 0;
    let mut body_start = None;
    for line in text.split_inclusive('\n') {
        match body_start {
            None if line.trim() == opener => body_start = Some(offset + line.len()),
            Some(start) if line.trim() == "```" => return Some(&text[start..offset]),
            _ => {}
        }
        offset += line.len();
    }
    None
}

fn find_json(text: &str, tag: &str) -> Option<Value> {
    for candidate in [extract_fenced_block(text, tag), extract_fenced_block(text, "json")]
        .into_iter()
        .flatten()
    {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Some(value);
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    // Last resort: outermost braces inside prose
    if let Some(start) = text.find('{')
        && let Some(end) = text.rfind('}')
        && end > start
        && let Ok(value) = serde_json::from_str::<Value>(&text[start..=end])
    {
        return Some(value);
    }

    None
}

/// One `dependencies` entry: a 1-based position in the parsed list, either
/// as a number, a numeric string, or a full step id.
fn dependency_id(entry: &Value, director_id: &str, round: u32) -> Option<String> {
    let position = match entry {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(n) => Some(n),
                Err(_) => return (!s.is_empty()).then(|| s.to_string()),
            }
        }
        _ => None,
    }?;
    let index = usize::try_from(position).ok()?.checked_sub(1)?;
    Some(step_id(director_id, round, index))
}

/// Parse a step array. Entries without a description are skipped; missing
/// types are inferred and missing confidences take `default_confidence`.
///
/// Dependencies are kept only when they name an earlier step of the same
/// list, so a parsed list never forms a cycle.
pub fn parse_steps(
    steps: &[Value],
    director_id: &str,
    round: u32,
    default_confidence: f64,
) -> Vec<Step> {
    let mut parsed: Vec<Step> = Vec::new();
    let candidates = steps
        .iter()
        .filter_map(|entry| {
            let description = entry
                .get("description")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())?;
            let step_type = entry
                .get("type")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(StepType::from_tag)
                .unwrap_or_else(|| StepType::infer(description));
            let confidence = entry
                .get("confidence")
                .and_then(|v| v.as_f64())
                .unwrap_or(default_confidence);
            let rationale = entry
                .get("rationale")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty());
            let dependencies = entry
                .get("dependencies")
                .and_then(|v| v.as_array())
                .map(|deps| {
                    deps.iter()
                        .filter_map(|d| dependency_id(d, director_id, round))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            Some((description, step_type, confidence, rationale, dependencies))
        });

    for (index, (description, step_type, confidence, rationale, dependencies)) in
        candidates.enumerate()
    {
        let mut kept: Vec<String> = Vec::new();
        for dependency in dependencies {
            if parsed.iter().any(|s| s.step_id == dependency) && !kept.contains(&dependency) {
                kept.push(dependency);
            } else {
                tracing::debug!(director = director_id, dependency = %dependency, "Dropping dependency on a step not listed before it");
            }
        }
        let step = Step::new(
            step_id(director_id, round, index),
            director_id,
            step_type,
            description,
            confidence,
        )
        .with_dependencies(kept);
        parsed.push(match rationale {
            Some(r) => step.with_rationale(r),
            None => step,
        });
    }
    parsed
}

/// Parse an agent's final answer.
///
/// Expected schema:
/// ```json
/// {
///   "summary": "string",
///   "confidence": 0.8,
///   "steps": [{"type": "trim", "description": "...", "confidence": 0.7, "rationale": "..."}]
/// }
/// ```
///
/// Returns `None` when no JSON object with a `summary` or `steps` field is found.
///
/// ```
/// use council_domain::plan::parsing::parse_report;
///
/// let text = "Done.\n```report\n{\"summary\": \"Slow intro\", \"confidence\": 0.8, \"steps\": [{\"description\": \"Trim the first 5 seconds\"}]}\n```";
/// let report = parse_report(text, "pacing", 0).unwrap();
/// assert_eq!(report.steps[0].step_id, "pacing-r0-s1");
/// assert_eq!(report.steps[0].confidence, 0.8);
/// ```
pub fn parse_report(text: &str, director_id: &str, round: u32) -> Option<ParsedReport> {
    let json = find_json(text, "report")?;
    let summary = json.get("summary").and_then(|v| v.as_str());
    let steps = json.get("steps").and_then(|v| v.as_array());
    if summary.is_none() && steps.is_none() {
        return None;
    }

    let confidence = clamp_confidence(
        json.get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_REPORT_CONFIDENCE),
    );
    let steps = steps
        .map(|s| parse_steps(s, director_id, round, confidence))
        .unwrap_or_default();

    Some(ParsedReport {
        summary: summary.unwrap_or_default().trim().to_string(),
        confidence,
        steps,
    })
}

/// Parse a debate reply.
///
/// Expected schema: `{"message_type": "critique", "content": "...", "steps": [...]?}`.
/// `default_confidence` applies to revised steps without their own confidence.
pub fn parse_debate_reply(
    text: &str,
    director_id: &str,
    round: u32,
    default_confidence: f64,
) -> Option<DebateReply> {
    let json = find_json(text, "debate")?;
    let content = json.get("content").and_then(|v| v.as_str())?.trim();
    let message_type = json
        .get("message_type")
        .and_then(|v| v.as_str())
        .map(MessageType::from_reply)
        .unwrap_or(MessageType::Critique);
    let steps = json
        .get("steps")
        .and_then(|v| v.as_array())
        .map(|s| parse_steps(s, director_id, round, default_confidence));

    Some(DebateReply {
        message_type,
        content: content.to_string(),
        steps,
    })
}

/// Parse the synthesis pass reply: `{"title": "...", "summary": "..."}`.
/// Blank fields count as missing.
pub fn parse_synthesis_reply(text: &str) -> Option<SynthesisReply> {
    let json = find_json(text, "synthesis")?;
    let field = |name: &str| {
        json.get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(SynthesisReply {
        title: field("title")?,
        summary: field("summary")?,
    })
}

const CLARIFYING_PHRASES: &[&str] = &[
    "could you",
    "can you provide",
    "can you share",
    "please provide",
    "please share",
    "would you like",
    "do you want",
    "let me know",
    "which project",
    "what would you like",
];

/// Whether a tool-less final answer is the model asking the human for input
/// instead of analyzing.
pub fn is_clarifying_question(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_lowercase();
    trimmed.ends_with('?') || CLARIFYING_PHRASES.iter().any(|p| lower.contains(p))
}
