//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plan, per-director breakdown and the debate transcript
    Full,
    /// Only the ranked plan
    Summary,
    /// The persisted record as JSON
    Json,
}

/// CLI arguments for director-council
#[derive(Parser, Debug)]
#[command(name = "director-council")]
#[command(author, version, about = "Director council - parallel AI directors agree on an edit plan")]
#[command(long_about = r#"
Director council runs several analysis directors over a video project and
merges their proposals into one ranked improvement plan.

A run has up to three phases:
1. Analysis:  every selected director inspects the project in parallel
2. Debate:    directors critique each other and may revise their steps
3. Synthesis: near-duplicate steps are merged and ranked by confidence

Configuration files are loaded from (in priority order):
1. --config <path>       Explicit config file
2. ./council.toml        Project-level config
3. ~/.config/director-council/config.toml   Global config
4. COUNCIL_* environment variables

Example:
  director-council run --project teaser.json "Tighten the first minute"
  director-council run -d pacing -d audio --debate-rounds 2 "Make it punchier"
  director-council plans
  director-council show 6f1c... --graph
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a project with the selected directors
    Run(RunArgs),

    /// List available directors
    Directors,

    /// List persisted plans, most recent first
    Plans,

    /// Show a persisted plan
    Show {
        /// Run id as printed by `run` or `plans`
        run_id: String,

        /// Include the execution graph
        #[arg(long)]
        graph: bool,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// What the directors should work on
    pub task: String,

    /// Director to include (can be specified multiple times)
    #[arg(short, long = "director", value_name = "ID")]
    pub directors: Vec<String>,

    /// Debate rounds, 0 disables the debate (max 3)
    #[arg(long, value_name = "N")]
    pub debate_rounds: Option<u32>,

    /// Global run deadline in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Project snapshot (JSON) the analysis tools inspect
    #[arg(short, long, value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "director-council",
            "-vv",
            "run",
            "-d",
            "pacing",
            "--director",
            "audio",
            "--debate-rounds",
            "2",
            "--output",
            "json",
            "Tighten the intro",
        ]);
        assert_eq!(cli.verbose, 2);
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.directors, vec!["pacing", "audio"]);
        assert_eq!(args.debate_rounds, Some(2));
        assert_eq!(args.timeout_ms, None);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.task, "Tighten the intro");
    }

    #[test]
    fn test_parse_show_with_global_after_subcommand() {
        let cli = Cli::parse_from(["director-council", "show", "abc", "--graph", "-q"]);
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Some(Command::Show { ref run_id, graph: true }) if run_id == "abc"
        ));
    }
}
