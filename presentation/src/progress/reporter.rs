//! Progress reporting for director runs

use colored::Colorize;
use council_application::ProgressNotifier;
use council_domain::{DebateMessage, ReportStatus, RunPhase};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

use crate::output::console::ConsoleFormatter;

fn phase_display_name(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Analyzing => "Phase 1: Analysis",
        RunPhase::Debating => "Phase 2: Debate",
        RunPhase::Synthesizing => "Phase 3: Synthesis",
        RunPhase::Idle => "Idle",
        RunPhase::Done => "Done",
        RunPhase::Failed => "Failed",
    }
}

fn status_line(director_name: &str, status: ReportStatus) -> String {
    match status {
        ReportStatus::Complete => format!("{} {}", "v".green(), director_name),
        ReportStatus::Degenerate => format!(
            "{} {} ({})",
            "-".yellow(),
            director_name,
            ConsoleFormatter::report_status_label(status)
        ),
        ReportStatus::Failed => format!("{} {} (failed)", "x".red(), director_name),
    }
}

/// Reports progress during a run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn bar(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.phase_bar.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: RunPhase, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(phase_display_name(phase).to_string());
        pb.set_message("Starting...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        if let Some(previous) = self.bar().replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn on_director_complete(&self, _phase: RunPhase, director_name: &str, status: ReportStatus) {
        if let Some(pb) = self.bar().as_ref() {
            pb.set_message(status_line(director_name, status));
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, phase: RunPhase) {
        if let Some(pb) = self.bar().take() {
            pb.finish_with_message(format!("{} complete!", phase.display_name().green()));
        }
    }

    fn on_debate_message(&self, message: &DebateMessage) {
        // Only debate replies; round 0 summaries are shown in the final output
        if message.round_number == 0 {
            return;
        }
        let line = format!(
            "  {} {} [{}]",
            format!("R{}", message.round_number).dimmed(),
            message.director_name.bold(),
            message.message_type.as_str()
        );
        let _ = self.multi.println(line);
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: RunPhase, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            phase_display_name(phase).bold(),
            total_tasks
        );
    }

    fn on_director_complete(&self, _phase: RunPhase, director_name: &str, status: ReportStatus) {
        eprintln!("  {}", status_line(director_name, status));
    }

    fn on_phase_complete(&self, _phase: RunPhase) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        colored::control::set_override(false);
        assert_eq!(status_line("Pacing", ReportStatus::Complete), "v Pacing");
        assert_eq!(
            status_line("Audio", ReportStatus::Degenerate),
            "- Audio (no steps)"
        );
        assert_eq!(status_line("Color", ReportStatus::Failed), "x Color (failed)");
    }

    #[test]
    fn test_reporter_survives_unbalanced_calls() {
        let reporter = ProgressReporter::new();
        reporter.on_director_complete(RunPhase::Analyzing, "early", ReportStatus::Complete);
        reporter.on_phase_complete(RunPhase::Analyzing);
        reporter.on_phase_start(RunPhase::Debating, 2);
        reporter.on_phase_start(RunPhase::Debating, 2);
        reporter.on_director_complete(RunPhase::Debating, "Pacing", ReportStatus::Complete);
        reporter.on_phase_complete(RunPhase::Debating);
        assert!(reporter.bar().is_none());
    }
}
