use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use fleetmap::app::{AppOptions, FleetViewApp};
use fleetmap::config::{LayoutConfig, load_layout_config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Fleet snapshot JSON to watch. A built-in sample fleet is shown without it.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Poll interval in milliseconds when the platform has no native file
    /// events and the watcher falls back to polling.
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,

    /// TOML file with layout tunables.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let layout = match &args.config {
        Some(path) => load_layout_config(path)?,
        None => LayoutConfig::default(),
    };
    info!(config = ?args.config, snapshot = ?args.snapshot, "starting fleetmap");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };
    let app_options = AppOptions {
        snapshot: args.snapshot,
        poll_interval: Duration::from_millis(args.poll_ms.max(50)),
        layout,
    };

    eframe::run_native(
        "fleetmap",
        options,
        Box::new(move |cc| Ok(Box::new(FleetViewApp::new(cc, app_options)))),
    )
    .map_err(|error| anyhow!("{error}"))
    .context("viewer exited with an error")
}
