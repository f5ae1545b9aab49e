//! Prompt templates for the director flow

use crate::director::Director;
use crate::plan::{RankedStep, Step};

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

/// Another director's current position, shown during debate.
#[derive(Debug, Clone, Copy)]
pub struct PeerPosition<'a> {
    pub name: &'a str,
    pub summary: &'a str,
    pub steps: &'a [Step],
}

const REPORT_FORMAT: &str = r#"End your answer with exactly one fenced block in this format:

```report
{
  "summary": "1-3 sentence overall assessment",
  "confidence": 0.0,
  "steps": [
    {"type": "trim|split_clip|transition|adjust_audio|effect|caption|reorder_clips|add_music|add_voice|remove_clip|edit_timeline",
     "description": "specific, actionable edit",
     "confidence": 0.0,
     "rationale": "why this helps",
     "dependencies": [1]}
  ]
}
```

`dependencies` is optional and lists the 1-based positions of earlier steps in your own list that must be applied first."#;

const DEBATE_FORMAT: &str = r#"Reply with exactly one fenced block in this format:

```debate
{
  "message_type": "critique|defense|revision|final",
  "content": "your response to the other directors",
  "steps": [ ... optional: your complete revised step list, same shape as in your report ... ]
}
```
Use "final" when you have nothing left to add. Include "steps" only if you change your proposal; it replaces your previous list."#;

fn format_steps(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "  (no steps)\n".to_string();
    }
    steps
        .iter()
        .map(|s| {
            format!(
                "  - [{}] {} (confidence {:.2})\n",
                s.step_type, s.description, s.confidence
            )
        })
        .collect()
}

impl PromptTemplate {
    /// User prompt for the analysis phase
    pub fn analysis_task(task: &str, director: &Director) -> String {
        let expertise = if director.expertise().is_empty() {
            "your specialty".to_string()
        } else {
            director.expertise().join(", ")
        };
        format!(
            r#"Task: {task}

Analyze the current video project from your perspective as {name}.

Instructions:
1. Start by calling the available analysis tools to inspect the project. Do not ask the user anything; everything you need is reachable through the tools.
2. Focus on your areas of expertise: {expertise}.
3. Propose specific, actionable edit steps.

{format}"#,
            task = task,
            name = director.name,
            expertise = expertise,
            format = REPORT_FORMAT,
        )
    }

    /// Appended to the analysis prompt when the first attempt asked a
    /// clarifying question instead of working.
    pub fn reinforced_instruction() -> &'static str {
        r#"IMPORTANT: Do not ask questions. The user is not available to answer.
Call the analysis tools right away, then produce your report in the required format."#
    }

    /// Request for a final report once the tool budget is spent
    pub fn final_report_request() -> String {
        format!(
            "You have used all of your tool calls. Write your final report now based on what you found.\n\n{}",
            REPORT_FORMAT
        )
    }

    /// User prompt for one debate round
    pub fn debate_prompt(
        round: u32,
        task: &str,
        director: &Director,
        own_steps: &[Step],
        peers: &[PeerPosition<'_>],
    ) -> String {
        let mut prompt = format!(
            "Round {} of the director debate.\nTask: {}\n\nYou are {}. Your current proposal:\n{}\nOther directors:\n",
            round,
            task,
            director.name,
            format_steps(own_steps)
        );
        for peer in peers {
            prompt.push_str(&format!(
                "\n--- {} ---\nSummary: {}\nSteps:\n{}",
                peer.name,
                crate::core::string::preview(peer.summary, 500),
                format_steps(peer.steps)
            ));
        }
        prompt.push_str(
            "\nCritique points you disagree with, defend your proposal where it holds, or revise it.\n\n",
        );
        prompt.push_str(DEBATE_FORMAT);
        prompt
    }

    /// System prompt for the synthesis pass
    pub fn synthesis_system() -> &'static str {
        r#"You are the lead editor summarizing a panel of directors.
Given the merged, ranked edit steps, write a short plan title and a 2-4 sentence summary.
Do not invent steps that are not listed."#
    }

    /// User prompt for the synthesis pass
    pub fn synthesis_prompt(task: &str, directors: &[String], steps: &[RankedStep]) -> String {
        let mut prompt = format!(
            "Task: {}\nDirectors: {}\n\nRanked steps:\n",
            task,
            directors.join(", ")
        );
        for (i, ranked) in steps.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. [{}] {} (confidence {:.2}, proposed by {})",
                i + 1,
                ranked.step.step_type,
                ranked.step.description,
                ranked.confidence,
                ranked.corroborated_by.join(", ")
            ));
            let after: Vec<String> = ranked
                .depends_on
                .iter()
                .filter_map(|id| steps.iter().position(|s| &s.step.step_id == id))
                .map(|index| (index + 1).to_string())
                .collect();
            if !after.is_empty() {
                prompt.push_str(&format!(" after {}", after.join(", ")));
            }
            prompt.push('\n');
        }
        prompt.push_str(
            r#"
Reply with one fenced block:

```synthesis
{"title": "short plan title", "summary": "2-4 sentences"}
```"#,
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::entities::fixtures::director;
    use crate::plan::StepType;

    #[test]
    fn test_analysis_task_mentions_tools_and_format() {
        let prompt = PromptTemplate::analysis_task("tighten the intro", &director("a"));
        assert!(prompt.contains("Task: tighten the intro"));
        assert!(prompt.contains("editing, rhythm"));
        assert!(prompt.contains("```report"));
        assert!(prompt.contains("Do not ask the user"));
    }

    #[test]
    fn test_debate_prompt_lists_peers() {
        let revised = vec![Step::new("b-r1-s1", "b", StepType::AdjustAudio, "duck music under voice", 0.8)];
        let peers = [PeerPosition {
            name: "Director b",
            summary: "audio is loud",
            steps: &revised,
        }];
        let prompt = PromptTemplate::debate_prompt(2, "task", &director("a"), &[], &peers);
        assert!(prompt.starts_with("Round 2"));
        assert!(prompt.contains("--- Director b ---"));
        assert!(prompt.contains("[adjust_audio] duck music under voice (confidence 0.80)"));
        assert!(prompt.contains("(no steps)"));
        assert!(prompt.contains("```debate"));
    }

    #[test]
    fn test_synthesis_prompt_lists_steps() {
        let ranked = RankedStep {
            step: Step::new("a-r0-s1", "a", StepType::Caption, "add title card", 0.4),
            confidence: 0.4,
            corroborated_by: vec!["a".to_string()],
            round: 0,
            agent_index: 0,
            depends_on: Vec::new(),
        };
        let mut follow_up = ranked.clone();
        follow_up.step = Step::new("a-r0-s2", "a", StepType::Effect, "animate the title", 0.4);
        follow_up.depends_on = vec!["a-r0-s1".to_string()];
        let prompt =
            PromptTemplate::synthesis_prompt("task", &["A".to_string()], &[ranked, follow_up]);
        assert!(prompt.contains("1. [caption] add title card (confidence 0.40, proposed by a)\n"));
        assert!(prompt.contains("2. [effect] animate the title (confidence 0.40, proposed by a) after 1\n"));
        assert!(prompt.contains("```synthesis"));
    }
}
