//! CLI entrypoint for Debate Console
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use debate_application::{
    CompositeEmitter, DebateRepository, EventEmitter, LlmGateway, NoRepository, RunDebateUseCase,
};
use debate_domain::{DebateMethod, DebateSession, Question, SessionId, SessionStatus};
use debate_infrastructure::{
    ConfigLoader, FileConfig, JsonFileDebateRepository, JsonlEventLogger, RoutingGateway,
    Severity,
};
use debate_presentation::{
    AskArgs, Cli, Command, ConsoleFormatter, HistoryCommand, OutputFormat, ProgressReporter,
    ServeArgs, ServerState, SessionHub, SimpleProgress,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_dir().map(PathBuf::as_path))?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    check_config(&config)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Ask(args) => ask(&config, args, cli.transcript.as_deref()).await,
        Command::Serve(args) => serve(&config, args, cli.transcript.as_deref()).await,
        Command::History { action } => history(&config, action).await,
        Command::Providers => providers(&config),
    }
}

/// Console logging from `-v` (or `RUST_LOG`), plus a daily file when `log_dir` is set.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "debate-console.log");
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
        .with(file)
        .init();

    Ok(guard)
}

fn check_config(config: &FileConfig) -> Result<()> {
    let mut fatal = Vec::new();
    for issue in config.validate() {
        match issue.severity {
            Severity::Warning => warn!("config: {}", issue.message),
            Severity::Error => fatal.push(issue.message),
        }
    }
    if !fatal.is_empty() {
        bail!("invalid configuration:\n  {}", fatal.join("\n  "));
    }
    Ok(())
}

/// Gateway over every provider the debate config mentions
fn build_gateway(config: &FileConfig) -> RoutingGateway {
    let debate = config.debate_config();
    let mut wanted = vec![debate.consensus_provider.clone()];
    wanted.extend(debate.council_providers.iter().cloned());
    RoutingGateway::from_config(&config.providers, &wanted)
}

fn build_repository(config: &FileConfig) -> Arc<dyn DebateRepository> {
    if !config.history.enabled {
        return Arc::new(NoRepository);
    }
    match config.history.resolved_dir() {
        Some(dir) => Arc::new(JsonFileDebateRepository::new(dir)),
        None => {
            warn!("no data directory found; debate history is disabled");
            Arc::new(NoRepository)
        }
    }
}

/// Transcript emitter for `--transcript`; a directory gets a timestamped file.
fn build_transcript(path: Option<&Path>) -> Option<Arc<dyn EventEmitter>> {
    let path = path?;
    let path = if path.is_dir() {
        JsonlEventLogger::default_path(path)
    } else {
        path.to_path_buf()
    };
    let logger = JsonlEventLogger::new(&path)?;
    info!("Writing event transcript to {}", logger.path().display());
    Some(Arc::new(logger))
}

fn build_use_case<G: LlmGateway + 'static>(
    config: &FileConfig,
    gateway: Arc<G>,
    emitter: CompositeEmitter,
    repository: Arc<dyn DebateRepository>,
) -> RunDebateUseCase<G> {
    let mut debate = config.debate_config();
    debate.restrict_council_to(&gateway.available_providers());
    RunDebateUseCase::new(gateway, debate)
        .with_emitter(Arc::new(emitter))
        .with_repository(repository)
}

async fn ask(config: &FileConfig, args: AskArgs, transcript: Option<&Path>) -> Result<()> {
    let question = Question::try_new(args.question.as_str())?;
    let gateway = Arc::new(build_gateway(config));

    let mut emitter = CompositeEmitter::default();
    let quiet = args.quiet || args.output == OutputFormat::Json;
    if !quiet {
        if std::io::stderr().is_terminal() {
            emitter.push(Arc::new(ProgressReporter::new()));
        } else {
            emitter.push(Arc::new(SimpleProgress));
        }
    }
    if let Some(logger) = build_transcript(transcript) {
        emitter.push(logger);
    }

    let use_case = build_use_case(config, gateway, emitter, build_repository(config));

    if !quiet {
        let estimate = use_case.estimate(args.method);
        eprintln!(
            "Running {} debate: {} calls, about ${:.3} ({})",
            args.method, estimate.total_calls, estimate.estimated_cost, estimate.breakdown
        );
    }

    let session = DebateSession::new(question, args.debate_context(), args.method);
    let cancellation = CancellationToken::new();
    let ctrl_c = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling debate");
            ctrl_c.cancel();
        }
    });

    let session = use_case.execute(session, cancellation).await;
    use_case.flush().await;

    println!("{}", render(&session, args.output));

    match &session.status {
        SessionStatus::Completed => Ok(()),
        SessionStatus::Cancelled => bail!("debate cancelled"),
        SessionStatus::Failed(message) => bail!("debate failed: {message}"),
        SessionStatus::Running => bail!("debate did not finish"),
    }
}

async fn serve(config: &FileConfig, args: ServeArgs, transcript: Option<&Path>) -> Result<()> {
    let gateway = Arc::new(build_gateway(config));
    let providers = gateway.available_providers();
    if providers.is_empty() {
        warn!("No provider has credentials; every debate will fail");
    }

    let hub = Arc::new(SessionHub::new());
    let mut emitter = CompositeEmitter::default();
    emitter.push(hub.clone());
    if let Some(logger) = build_transcript(transcript) {
        emitter.push(logger);
    }

    let repository = build_repository(config);
    let use_case = build_use_case(config, gateway, emitter, Arc::clone(&repository));
    let state = ServerState::new(Arc::new(use_case), hub, repository, providers);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{host}:{port}");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            signal.cancel();
        }
    });

    debate_presentation::serve(state, &bind_addr, shutdown)
        .await
        .with_context(|| format!("server on {bind_addr} failed"))
}

async fn history(config: &FileConfig, action: HistoryCommand) -> Result<()> {
    if !config.history.enabled {
        bail!("debate history is disabled ([history] enabled = false)");
    }
    let repository = build_repository(config);

    match action {
        HistoryCommand::List { json } => {
            let summaries = repository.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print!("{}", ConsoleFormatter::format_history(&summaries));
            }
        }
        HistoryCommand::Show { id, output } => {
            let id = SessionId::from(id);
            match repository.get(&id).await? {
                Some(session) => println!("{}", render(&session, output)),
                None => bail!("no saved debate with id {id}"),
            }
        }
    }
    Ok(())
}

fn providers(config: &FileConfig) -> Result<()> {
    let gateway = Arc::new(build_gateway(config));
    let available = gateway.available_providers();
    let use_case = build_use_case(
        config,
        gateway,
        CompositeEmitter::default(),
        Arc::new(NoRepository),
    );

    let estimates: Vec<_> = [DebateMethod::Consensus, DebateMethod::Council, DebateMethod::Both]
        .into_iter()
        .map(|method| use_case.estimate(method))
        .collect();
    print!("{}", ConsoleFormatter::format_providers(&available, &estimates));
    Ok(())
}

fn render(session: &DebateSession, output: OutputFormat) -> String {
    match output {
        OutputFormat::Full => ConsoleFormatter::format(session),
        OutputFormat::Decision => ConsoleFormatter::format_decision(session),
        OutputFormat::Json => ConsoleFormatter::format_json(session),
    }
}
