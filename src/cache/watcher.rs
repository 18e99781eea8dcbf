//! Cache directory watcher for restart-on-change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A watcher that monitors the cache directory for changes.
///
/// Every create/modify/remove notification on the watched path is
/// forwarded on the channel; the lifecycle control loop turns each one
/// into a restart. No coalescing of rapid successive changes.
pub struct CacheWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<PathBuf>,
}

impl CacheWatcher {
    /// Create a new CacheWatcher forwarding change notifications to
    /// the given channel.
    pub fn new(path: &Path, change_tx: mpsc::UnboundedSender<PathBuf>) -> Self {
        Self {
            path: path.to_path_buf(),
            change_tx,
        }
    }

    /// Arm the watch. The watch stays active for as long as the
    /// returned watcher handle is kept alive; dropping it disarms.
    ///
    /// Only the path itself and its direct children are observed, not
    /// nested contents.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove() {
                        tracing::info!(path = ?path, kind = ?event.kind, "cache change detected");
                        let _ = tx.send(path.clone());
                    }
                }
                Err(e) => tracing::error!("watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "cache watcher armed");
        Ok(watcher)
    }
}
