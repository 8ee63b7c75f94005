use anyhow::Context;
use clap::Parser;
use puzzle_battler::advisors::RandomAdvisor;
use puzzle_battler::cli::{run_repl, Cli};
use puzzle_battler::core::{load_settings, save_settings};
use puzzle_battler::puzzles::PuzzleCatalog;
use puzzle_battler::session::{SessionController, SessionHandle};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(cli.settings.as_deref());
    cli.apply_overrides(&mut settings);
    let settings = settings.sanitized();
    if cli.save_settings {
        save_settings(&settings, cli.settings.as_deref()).context("saving settings")?;
    }

    let catalog = match &cli.puzzles {
        Some(path) => PuzzleCatalog::load(path)
            .with_context(|| format!("loading puzzle catalog {}", path.display()))?,
        None => PuzzleCatalog::builtin().context("loading built-in puzzles")?,
    };
    info!("[CATALOG] {} puzzles available", catalog.len());

    let controller = SessionController::new(settings.engine_config(), settings.session_config());
    let handle = SessionHandle::spawn(
        controller,
        Arc::new(RandomAdvisor::new()),
        settings.tick_interval(),
    );

    if let Some(id) = &cli.puzzle {
        let definition = catalog.get(id)?.clone();
        if let Err(e) = handle.start_puzzle(definition).await {
            error!("[SESSION] Could not start puzzle '{}': {}", id, e);
        }
    }

    run_repl(&handle, &catalog).await?;
    handle.shutdown().await?;
    Ok(())
}
