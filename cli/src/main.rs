//! CLI entrypoint for director-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.
//!
//! The process main thread plays the UI-owning thread: it drains the tool
//! bridge while the orchestration runs on a multi-thread tokio runtime.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    DirectorSource, MainThreadBridge, NoEvents, OrchestrationConfig, PlanStore, ProgressNotifier,
    RunDirectorsInput, RunDirectorsUseCase, RunEventSink,
};
use council_domain::{AnalysisTask, PlanRecord, RunOptions};
use council_infrastructure::{
    ConfigLoader, FileConfig, FileDirectorSource, FilePlanStore, JsonlEventLog, ProjectSnapshot,
    project_tool_registry,
};
use council_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, RunArgs, SimpleProgress,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;

    match cli.command {
        Some(Command::Run(ref args)) => run(&cli, &config, args),
        Some(Command::Directors) => {
            let roster = director_source(&config).load()?;
            print!("{}", ConsoleFormatter::format_directors(&roster));
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Plans) => {
            let plans = plan_store(&config).list()?;
            print!("{}", ConsoleFormatter::format_plan_list(&plans));
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Show { ref run_id, graph }) => {
            let record = plan_store(&config).load(run_id)?;
            print!(
                "{}",
                ConsoleFormatter::format_full(&record.plan, &record.graph)
            );
            if graph {
                print!("{}", ConsoleFormatter::format_graph(&record.graph));
            }
            Ok(ExitCode::SUCCESS)
        }
        None => bail!("No command given. Try `director-council run --help`."),
    }
}

/// Console diagnostics by verbosity (`RUST_LOG` wins), plus an optional
/// non-blocking file writer.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &cli.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .context("--log-file must name a file")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let issues = config.validate();
    for issue in &issues {
        eprintln!("{}", issue);
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Configuration has errors");
    }
    Ok(config)
}

fn director_source(config: &FileConfig) -> FileDirectorSource {
    FileDirectorSource::new(config.directors.scan_dirs())
}

fn plan_store(config: &FileConfig) -> FilePlanStore {
    FilePlanStore::new(config.store.resolved_dir())
}

#[cfg(feature = "http-gateway")]
fn run(cli: &Cli, config: &FileConfig, args: &RunArgs) -> Result<ExitCode> {
    let orchestration: OrchestrationConfig = config.orchestration.to_orchestration_config();

    // === Input ===
    let roster = director_source(config).load()?;
    let ids: Vec<String> = if !args.directors.is_empty() {
        args.directors.clone()
    } else if !config.directors.default_selection.is_empty() {
        config.directors.default_selection.clone()
    } else {
        roster.iter().map(|d| d.id.clone()).collect()
    };
    let task = AnalysisTask::try_new(args.task.clone()).context("The task must not be empty")?;
    let options = RunOptions::new(
        args.debate_rounds
            .unwrap_or(orchestration.defaults.debate_rounds),
        args.timeout_ms.unwrap_or(orchestration.defaults.timeout_ms),
    );
    let input = RunDirectorsInput::from_ids(task, &roster, &ids, options)?;

    let snapshot = match &args.project {
        Some(path) => ProjectSnapshot::load(path)?,
        None => {
            warn!("No --project given, tools will see an empty project");
            ProjectSnapshot::default()
        }
    };

    // === Dependency Injection ===
    let registry = Arc::new(project_tool_registry(Arc::new(snapshot)));
    let (bridge, executor) = MainThreadBridge::channel(registry, orchestration.bridge);
    executor.bind_current_thread();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("council-worker")
        .build()
        .context("Failed to start the async runtime")?;

    let gateway = Arc::new(build_gateway(config)?);

    let events: Arc<dyn RunEventSink> = match &config.logging.event_log {
        Some(path) => match JsonlEventLog::open(path) {
            Some(log) => Arc::new(log),
            None => Arc::new(NoEvents),
        },
        None => Arc::new(NoEvents),
    };
    let progress: Arc<dyn ProgressNotifier> = if cli.quiet {
        Arc::new(council_application::NoProgress)
    } else if args.output == OutputFormat::Json {
        Arc::new(SimpleProgress)
    } else {
        Arc::new(ProgressReporter::new())
    };

    let use_case = RunDirectorsUseCase::new(gateway, bridge, orchestration)
        .with_store(Arc::new(plan_store(config)))
        .with_event_sink(events)
        .with_progress(progress);

    info!(
        directors = input.directors.len(),
        debate_rounds = input.options.debate_rounds,
        "Starting director run"
    );

    let handle = {
        let _enter = runtime.enter();
        use_case.spawn(input)
    };
    // The executor stops once every bridge handle is gone, which happens
    // when the run task finishes.
    drop(use_case);

    let cancel = handle.cancel_token();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, canceling the run");
            cancel.cancel();
        }
    });

    executor.run();
    let result = runtime.block_on(handle.join());

    match result {
        Ok(output) => {
            let text = match args.output {
                OutputFormat::Full => ConsoleFormatter::format_full(&output.plan, &output.graph),
                OutputFormat::Summary => ConsoleFormatter::format_summary(&output.plan),
                OutputFormat::Json => ConsoleFormatter::format_json(&PlanRecord {
                    run_id: output.run_id.clone(),
                    prompt: output.graph.prompt.clone(),
                    created_at: output.plan.created_at,
                    plan: output.plan.clone(),
                    graph: output.graph.clone(),
                }),
            };
            println!("{}", text);

            if output.saved {
                eprintln!("Saved as run {}", output.run_id);
            } else if let Some(error) = &output.save_error {
                eprintln!("Plan was not saved: {}", error);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprint!("{}", ConsoleFormatter::format_failure(&error));
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(feature = "http-gateway")]
fn build_gateway(config: &FileConfig) -> Result<council_infrastructure::OpenAiGateway> {
    use council_infrastructure::{OpenAiGateway, OpenAiSettings};
    Ok(OpenAiGateway::new(OpenAiSettings::from_config(&config.provider))?)
}

#[cfg(not(feature = "http-gateway"))]
fn run(_cli: &Cli, _config: &FileConfig, _args: &RunArgs) -> Result<ExitCode> {
    bail!("This build has no LLM gateway; rebuild with the `http-gateway` feature")
}
