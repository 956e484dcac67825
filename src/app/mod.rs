use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::Context;
use tracing::{info, warn};

use crate::config::LayoutConfig;
use crate::fleet::{FleetSnapshot, SnapshotWatcher, sample_snapshot};
use crate::layout::SimulationState;
use crate::scene::{ReconcileStats, Scene};

mod graph;
mod ui;

/// Startup settings resolved from the command line.
pub struct AppOptions {
    pub snapshot: Option<PathBuf>,
    pub poll_interval: Duration,
    pub layout: LayoutConfig,
}

pub struct FleetViewApp {
    source: SnapshotSource,
    view: ViewModel,
}

enum SnapshotSource {
    /// Sample fleet, or a snapshot path that could not be watched.
    Unwatched,
    Watched(SnapshotWatcher),
}

struct ViewModel {
    state: SimulationState,
    scene: Scene,
    tuning: LayoutConfig,
    source_label: String,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    last_error: Option<String>,
    last_stats: ReconcileStats,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    payload_revision: u64,
    matches: Arc<HashSet<String>>,
}

impl FleetViewApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: AppOptions) -> Self {
        match options.snapshot {
            Some(path) => {
                info!(path = %path.display(), "watching fleet snapshot");
                let label = path.display().to_string();
                let ctx = cc.egui_ctx.clone();
                let spawned = SnapshotWatcher::spawn(path, options.poll_interval, move || {
                    ctx.request_repaint();
                });
                match spawned {
                    Ok(watcher) => Self {
                        source: SnapshotSource::Watched(watcher),
                        view: ViewModel::new(options.layout, label),
                    },
                    Err(error) => {
                        warn!(error = %format!("{error:#}"), "snapshot watcher unavailable");
                        let mut view = ViewModel::new(options.layout, label);
                        view.last_error = Some(format!("{error:#}"));
                        Self {
                            source: SnapshotSource::Unwatched,
                            view,
                        }
                    }
                }
            }
            None => {
                info!("no snapshot given, showing the sample fleet");
                let mut view = ViewModel::new(options.layout, "sample fleet".to_owned());
                view.apply_snapshot(sample_snapshot());
                Self {
                    source: SnapshotSource::Unwatched,
                    view,
                }
            }
        }
    }
}

impl ViewModel {
    /// Keep the last good topology when a load fails; only the error banner
    /// changes.
    fn apply_snapshot(&mut self, snapshot: FleetSnapshot) {
        self.last_error = None;
        self.state.set_records(snapshot.machines, snapshot.services);
    }
}

impl eframe::App for FleetViewApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if let SnapshotSource::Watched(watcher) = &mut self.source
            && let Some(result) = watcher.try_latest()
        {
            match result {
                Ok(snapshot) => {
                    info!(
                        machines = snapshot.machines.len(),
                        services = snapshot.services.len(),
                        "applying fleet snapshot"
                    );
                    self.view.apply_snapshot(snapshot);
                }
                Err(error) => {
                    warn!(%error, "keeping previous fleet topology");
                    self.view.last_error = Some(error);
                }
            }
        }

        self.view.show(ctx);
    }
}
