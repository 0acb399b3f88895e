use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use scm_core::{logging, replay, BridgeConfig, DefaultScmService, ScmMainImpl};
use scm_plugin_api::ScmService;
use tracing::info;

/// Replay a recorded log of host-bound SCM messages and print the resulting
/// source controls.
#[derive(Debug, Parser)]
#[command(name = "scm-replay", version)]
struct Args {
    /// Newline-delimited JSON messages, one per line.
    log: Utf8PathBuf,

    /// JSON settings file.
    #[arg(long)]
    config: Option<Utf8PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => BridgeConfig::from_path(path)
            .with_context(|| format!("failed to load settings from {path}"))?,
        None => BridgeConfig::default(),
    };
    logging::initialize(&config.logging).context("failed to install log subscriber")?;

    let service = Arc::new(DefaultScmService::new());
    let svc: Arc<dyn ScmService> = service.clone();
    let host = ScmMainImpl::new(svc, config.registrar);

    let file = File::open(args.log.as_std_path())
        .with_context(|| format!("failed to open {}", args.log))?;
    let stats = replay(BufReader::new(file), &host)
        .with_context(|| format!("failed to replay {}", args.log))?;
    info!(
        messages = stats.messages,
        skipped = stats.skipped_lines,
        repositories = service.len(),
        "Replay finished"
    );

    let summaries = host.summaries().context("failed to collect source controls")?;
    let rendered =
        serde_json::to_string_pretty(&summaries).context("failed to render source controls")?;
    println!("{rendered}");

    Ok(())
}
