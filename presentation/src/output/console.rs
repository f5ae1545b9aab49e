//! Console output formatter for director plans

use colored::Colorize;
use council_domain::plan::debate::group_by_round;
use council_domain::{
    DebateMessage, DirectorRoster, NodeStatus, NodeType, OrchestrationError, Plan, PlanGraph,
    PlanRecord, PlanSummary, ReportStatus,
};

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Plan, per-director tool breakdown and debate transcript
    pub fn format_full(plan: &Plan, graph: &PlanGraph) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Director Council Plan"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Task:".cyan().bold(), graph.prompt));
        output.push_str(&Self::plan_body(plan));

        let breakdown = graph.breakdown();
        if !breakdown.is_empty() {
            output.push_str(&Self::section_header("Analysis"));
            for (branch, steps) in &breakdown {
                output.push_str(&format!("\n{}\n", format!("── {} ──", branch).yellow().bold()));
                if steps.is_empty() {
                    output.push_str(&format!("  {}\n", "(no tool calls)".dimmed()));
                }
                for step in steps {
                    output.push_str(&format!(
                        "  {} {} {}\n",
                        Self::status_mark(step.status),
                        step.label,
                        step.result_preview.dimmed()
                    ));
                }
            }
        }

        if !plan.debate_transcript.is_empty() {
            output.push_str(&Self::section_header("Debate"));
            output.push_str(&Self::format_debate(&plan.debate_transcript));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Ranked plan only (concise output)
    pub fn format_summary(plan: &Plan) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            "=== Director Council Plan ===".cyan().bold()
        ));
        output.push_str(&Self::plan_body(plan));
        output
    }

    /// Persisted record as pretty JSON
    pub fn format_json(record: &PlanRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    /// Transcript grouped by round, emission order kept inside a round
    pub fn format_debate(messages: &[DebateMessage]) -> String {
        let mut output = String::new();
        for (round, group) in group_by_round(messages) {
            let title = if round == 0 {
                "Round 0 (initial analysis)".to_string()
            } else {
                format!("Round {}", round)
            };
            output.push_str(&format!("\n{}\n", title.yellow().bold()));
            for message in group {
                output.push_str(&format!(
                    "  {} [{}]\n{}\n",
                    message.director_name.bold(),
                    message.message_type.as_str().cyan(),
                    Self::indent(&message.content, "    ")
                ));
            }
        }
        output
    }

    /// Execution tree, children indented under their parent
    pub fn format_graph(graph: &PlanGraph) -> String {
        let mut output = String::new();
        output.push_str(&Self::section_header("Execution Graph"));
        if let Some(root) = graph.root() {
            output.push_str(&format!("{} {}\n", root.label.bold(), root.description.dimmed()));
            for branch in graph.children(root.id) {
                output.push_str(&format!(
                    "├─ {} {}{}\n",
                    Self::status_mark(branch.status),
                    branch.label.yellow(),
                    branch
                        .result
                        .as_deref()
                        .filter(|note| !note.is_empty())
                        .map(|note| format!(" ({})", note))
                        .unwrap_or_default()
                ));
                for step in graph
                    .children(branch.id)
                    .filter(|n| n.node_type == NodeType::Step)
                {
                    output.push_str(&format!(
                        "│  └─ {} {} {}\n",
                        Self::status_mark(step.status),
                        step.label,
                        step.tool_name.as_deref().unwrap_or_default().dimmed()
                    ));
                }
            }
        }
        output.push_str(&format!(
            "{} nodes, {} tool calls\n",
            graph.len(),
            graph.step_count()
        ));
        output
    }

    pub fn format_plan_list(plans: &[PlanSummary]) -> String {
        if plans.is_empty() {
            return format!("{}\n", "No saved plans.".dimmed());
        }
        let mut output = String::new();
        for plan in plans {
            output.push_str(&format!(
                "{}  {}  {} ({} steps, confidence {:.2})\n    {}\n",
                plan.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                plan.run_id.cyan(),
                plan.title.bold(),
                plan.step_count,
                plan.confidence,
                plan.prompt
            ));
        }
        output
    }

    pub fn format_directors(roster: &DirectorRoster) -> String {
        if roster.is_empty() {
            return format!("{}\n", "No directors found.".dimmed());
        }
        let mut output = String::new();
        for director in roster.iter() {
            output.push_str(&format!(
                "{} {} {}\n    {}\n",
                director.id.cyan().bold(),
                director.name,
                format!("v{} by {}", director.version, director.author).dimmed(),
                director.description
            ));
            if !director.expertise().is_empty() {
                output.push_str(&format!(
                    "    {} {}\n",
                    "Expertise:".dimmed(),
                    director.expertise().join(", ")
                ));
            }
        }
        output
    }

    /// "No plan could be generated" with the aggregated reasons
    pub fn format_failure(error: &OrchestrationError) -> String {
        match error {
            OrchestrationError::AllAgentsFailed(reasons) => {
                let mut output = format!("{}\n", "No plan could be generated.".red().bold());
                for reason in reasons {
                    output.push_str(&format!("  {} {}\n", "x".red(), reason));
                }
                output
            }
            other => format!("{} {}\n", "Run failed:".red().bold(), other),
        }
    }

    pub fn report_status_label(status: ReportStatus) -> &'static str {
        match status {
            ReportStatus::Complete => "complete",
            ReportStatus::Degenerate => "no steps",
            ReportStatus::Failed => "failed",
        }
    }

    fn plan_body(plan: &Plan) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", plan.title.bold()));
        output.push_str(&format!(
            "{} {}   {} {:.2}\n\n",
            "Directors:".cyan().bold(),
            plan.created_by.join(", "),
            "Confidence:".cyan().bold(),
            plan.confidence
        ));
        output.push_str(&plan.summary);
        output.push('\n');

        output.push_str(&Self::section_header("Steps"));
        if plan.steps.is_empty() {
            output.push_str(&format!("{}\n", "(none)".dimmed()));
        }
        for (rank, ranked) in plan.steps.iter().enumerate() {
            output.push_str(&format!(
                "{:>2}. [{}] {} {}\n",
                rank + 1,
                ranked.step.step_type.as_str().yellow(),
                ranked.step.description,
                format!(
                    "({:.2}, {})",
                    ranked.confidence,
                    ranked.corroborated_by.join(" + ")
                )
                .dimmed()
            ));
            if let Some(rationale) = &ranked.step.rationale {
                output.push_str(&format!("    {}\n", rationale.dimmed()));
            }
            if !ranked.depends_on.is_empty() {
                let after: Vec<String> = ranked
                    .depends_on
                    .iter()
                    .map(|id| match plan.steps.iter().position(|s| &s.step.step_id == id) {
                        Some(index) => format!("#{}", index + 1),
                        None => id.clone(),
                    })
                    .collect();
                output.push_str(&format!("    {} {}\n", "after".dimmed(), after.join(", ")));
            }
        }

        if !plan.excluded.is_empty() {
            output.push_str(&format!("\n{}\n", "Excluded directors:".yellow().bold()));
            for excluded in &plan.excluded {
                output.push_str(&format!(
                    "  * {}: {}\n",
                    excluded.director_name, excluded.reason
                ));
            }
        }
        output
    }

    fn status_mark(status: NodeStatus) -> String {
        match status {
            NodeStatus::Completed => "v".green().to_string(),
            NodeStatus::Failed => "x".red().to_string(),
            NodeStatus::Running => "~".yellow().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
