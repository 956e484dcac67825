use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use notify::event::{AccessKind, AccessMode, MetadataKind, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::snapshot::{FleetSnapshot, load_snapshot};

/// Quiet period after the last file event before the snapshot is re-read.
/// Editors and `mv`-style replacements emit several events per save.
const DEBOUNCE: Duration = Duration::from_millis(100);

pub type SnapshotResult = Result<FleetSnapshot, String>;

type FileEvent = notify::Result<Event>;

/// Reloads a snapshot file on a background thread whenever the file system
/// reports a change to it. Dropping the watcher stops the thread.
pub struct SnapshotWatcher {
    path: PathBuf,
    rx: Receiver<SnapshotResult>,
    watcher: Option<RecommendedWatcher>,
    handle: Option<JoinHandle<()>>,
    disconnected: bool,
}

impl SnapshotWatcher {
    /// Starts watching `path`. The parent directory is watched so a file
    /// replaced by rename is still picked up. `poll_interval` only applies
    /// when the platform falls back to the polling backend.
    pub fn spawn(
        path: PathBuf,
        poll_interval: Duration,
        notify: impl Fn() + Send + 'static,
    ) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| anyhow!("snapshot path {} does not name a file", path.display()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::channel::<FileEvent>();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.send(res);
            },
            Config::default().with_poll_interval(poll_interval),
        )
        .context("failed to create the snapshot file watcher")?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        let (tx, rx) = mpsc::channel();
        let thread_path = path.clone();
        let handle = thread::spawn(move || {
            watch_loop(&thread_path, &file_name, &event_rx, &tx, &notify);
        });

        Ok(Self {
            path,
            rx,
            watcher: Some(watcher),
            handle: Some(handle),
            disconnected: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest pending load result, skipping any older ones still queued.
    pub fn try_latest(&mut self) -> Option<SnapshotResult> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(result) => latest = Some(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        self.disconnected = true;
                        latest = Some(Err("snapshot watcher disconnected".to_owned()));
                    }
                    break;
                }
            }
        }
        latest
    }
}

impl Drop for SnapshotWatcher {
    fn drop(&mut self) {
        // Dropping the notify watcher closes the event channel, which ends
        // the reload thread.
        self.watcher.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Whether `event` may have changed the contents of `file_name`. Our own
/// reads show up as access events and must not trigger another reload.
fn touches_snapshot(event: &Event, file_name: &OsString) -> bool {
    let content_change = match event.kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        _ => true,
    };
    content_change
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

fn reload(path: &Path, tx: &Sender<SnapshotResult>, notify: &dyn Fn()) -> bool {
    let result = load_snapshot(path).map_err(|error| format!("{error:#}"));
    match &result {
        Ok(snapshot) => debug!(
            path = %path.display(),
            machines = snapshot.machines.len(),
            services = snapshot.services.len(),
            "fleet snapshot loaded"
        ),
        Err(error) => warn!(path = %path.display(), %error, "fleet snapshot load failed"),
    }
    if tx.send(result).is_err() {
        return false;
    }
    notify();
    true
}

fn watch_loop(
    path: &Path,
    file_name: &OsString,
    events: &Receiver<FileEvent>,
    tx: &Sender<SnapshotResult>,
    notify: &dyn Fn(),
) {
    if !reload(path, tx, notify) {
        return;
    }

    loop {
        match events.recv() {
            Ok(Ok(event)) if touches_snapshot(&event, file_name) => {}
            Ok(Ok(_)) => continue,
            Ok(Err(error)) => {
                warn!(path = %path.display(), %error, "snapshot file watch error");
                continue;
            }
            Err(_) => return,
        }

        loop {
            match events.recv_timeout(DEBOUNCE) {
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        if !reload(path, tx, notify) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, DataChange};

    use super::*;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn only_content_changes_to_the_snapshot_count() {
        let name = OsString::from("fleet.json");

        assert!(touches_snapshot(
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                "/srv/fleet.json"
            ),
            &name
        ));
        assert!(touches_snapshot(
            &event(EventKind::Create(CreateKind::File), "/srv/fleet.json"),
            &name
        ));
        assert!(touches_snapshot(
            &event(
                EventKind::Access(AccessKind::Close(AccessMode::Write)),
                "/srv/fleet.json"
            ),
            &name
        ));

        assert!(!touches_snapshot(
            &event(
                EventKind::Access(AccessKind::Close(AccessMode::Read)),
                "/srv/fleet.json"
            ),
            &name
        ));
        assert!(!touches_snapshot(
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                "/srv/other.json"
            ),
            &name
        ));
    }
}
