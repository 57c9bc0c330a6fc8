//! Command-line entry point
//!
//! `wishlist-harvest <URL>` launches Chromium, runs one harvest event and
//! prints the response body to stdout (or writes it to `--output`). With
//! `--replay`, saved HTML files stand in for the live page, one file per
//! scroll frame.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::{EventHandler, HandlerResponse, HarvestEvent};
use crate::infrastructure::browser::ChromiumSession;
use crate::infrastructure::config::{ConfigLoader, HarvestConfig};
use crate::infrastructure::logging::init_logging_with_config;
use crate::infrastructure::scripted_document::ReplayOpener;

#[derive(Parser, Debug, Clone)]
#[command(name = "wishlist-harvest", version, about = "Extract a wishlist page into a validated JSON snapshot")]
pub struct Cli {
    /// Wishlist URL to harvest
    #[arg(required_unless_present = "print_config")]
    pub url: Option<String>,

    /// Scroll rounds before extraction (defaults to the configured value)
    #[arg(long, env = "WISHLIST_HARVEST_SCROLL_LOOPS")]
    pub scroll_loops: Option<u32>,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Write the response body here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Replay saved HTML instead of launching a browser; repeat for later scroll frames
    #[arg(long, value_name = "HTML_FILE")]
    pub replay: Vec<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    fn load_config(&self) -> Result<HarvestConfig> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::new().with_file(path),
            None => ConfigLoader::new(),
        };
        loader.load().context("Failed to load configuration")
    }
}

/// Run the CLI to completion and report the process exit code
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.load_config()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let url = cli.url.clone().ok_or_else(|| anyhow!("A wishlist URL is required"))?;
    let event = HarvestEvent::new(url).with_scroll_loops(cli.scroll_loops.unwrap_or(config.scroll.iterations));

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, cancelling harvest");
            ctrl_c_cancel.cancel();
        }
    });

    let response = if cli.replay.is_empty() {
        run_live(&cli, config, &event, cancel).await?
    } else {
        run_replay(&cli.replay, config, &event, cancel).await?
    };

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, &response.body)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("💾 Response written to {}", path.display());
        }
        None => println!("{}", response.body),
    }

    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Harvest finished with status {}", response.status_code);
        Ok(ExitCode::FAILURE)
    }
}

async fn run_live(
    cli: &Cli,
    config: HarvestConfig,
    event: &HarvestEvent,
    cancel: CancellationToken,
) -> Result<HandlerResponse> {
    let session = Arc::new(ChromiumSession::launch(&config.viewport, !cli.headful).await?);

    let handler = EventHandler::new(config, session.clone());
    let response = handler.handle(event, cancel).await;
    drop(handler);

    match Arc::try_unwrap(session) {
        Ok(session) => session.shutdown().await?,
        Err(_) => warn!("Browser session still shared, skipping shutdown"),
    }

    Ok(response)
}

async fn run_replay(
    files: &[PathBuf],
    config: HarvestConfig,
    event: &HarvestEvent,
    cancel: CancellationToken,
) -> Result<HandlerResponse> {
    let mut frames = Vec::with_capacity(files.len());
    for path in files {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay file {}", path.display()))?;
        frames.push(html);
    }
    info!("📂 Replaying {} saved frame(s)", frames.len());

    let handler = EventHandler::new(config, Arc::new(ReplayOpener::new(frames)));
    Ok(handler.handle(event, cancel).await)
}
