//! CLI entrypoint for huddle
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod simulate;

use anyhow::{Result, bail};
use clap::Parser;
use huddle_application::{
    CollabEngine, NoSafetyScan, NoSessionJournal, SafetyScanner, SessionJournal,
    SuggestionProvider,
};
use huddle_infrastructure::{
    ConfigLoader, ExtractiveSuggestionProvider, FileConfig, JsonlSessionJournal,
    RegexActionItemExtractor, RegexSafetyScanner,
};
use huddle_presentation::{Cli, Command, ConsoleFormatter, SimulateArgs};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let _guard = init_logging(&cli);
    info!("Starting huddle");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config error: {issue}");
        }
        bail!("invalid configuration ({} issue(s))", issues.len());
    }

    if cli.no_color || !config.output.color {
        ConsoleFormatter::set_color(false);
    }
    let format = cli
        .format
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();

    // === Dependency Injection ===
    let engine = build_engine(&config)?;

    let args = match cli.command {
        Some(Command::Simulate(args)) => args,
        None => SimulateArgs::default(),
    };
    let result = simulate::run(&engine, &args, format).await;

    engine.shutdown().await;
    result
}

/// Initialize logging based on verbosity level, optionally mirrored to a
/// daily-rotated file.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "huddle.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

fn build_engine(config: &FileConfig) -> Result<CollabEngine> {
    let suggestions = suggestion_provider(config)?;
    info!(provider = suggestions.name(), "Using suggestion provider");

    let safety: Arc<dyn SafetyScanner> = if config.safety.enabled {
        Arc::new(RegexSafetyScanner::new()?.with_blocked_terms(&config.safety.blocked_terms)?)
    } else {
        Arc::new(NoSafetyScan)
    };

    let journal: Arc<dyn SessionJournal> = if config.journal.enabled {
        match JsonlSessionJournal::in_dir(&config.journal.dir) {
            Some(journal) => {
                info!(path = %journal.path().display(), "Session journal enabled");
                Arc::new(journal)
            }
            None => {
                warn!("Session journal disabled: could not open {}", config.journal.dir);
                Arc::new(NoSessionJournal)
            }
        }
    } else {
        Arc::new(NoSessionJournal)
    };

    Ok(CollabEngine::builder(suggestions)
        .with_config(config.clone().into_engine_config())
        .with_safety_scanner(safety)
        .with_action_item_extractor(Arc::new(RegexActionItemExtractor::new()?))
        .with_journal(journal)
        .build())
}

fn suggestion_provider(config: &FileConfig) -> Result<Arc<dyn SuggestionProvider>> {
    match config.assistant.provider.as_str() {
        #[cfg(feature = "http-suggest")]
        "http" => {
            let endpoint = config.assistant.endpoint.clone().unwrap_or_default();
            let timeout = std::time::Duration::from_secs(config.assistant.http_timeout_secs);
            Ok(Arc::new(
                huddle_infrastructure::HttpSuggestionProvider::new(endpoint, timeout)?,
            ))
        }
        #[cfg(not(feature = "http-suggest"))]
        "http" => bail!("assistant.provider = \"http\" requires the `http-suggest` feature"),
        _ => Ok(Arc::new(ExtractiveSuggestionProvider::new())),
    }
}
