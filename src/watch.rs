//! File watching for development builds
//!
//! Changes under the frontend root are batched over a short quiet period,
//! then each changed file is invalidated in the build cache together with
//! everything that transitively depends on it.

use crate::cache::BuildCache;
use crate::config::schema::WatchConfig;
use crate::error::{RendrError, RendrResult};
use crate::paths;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Path segments never worth watching
const ALWAYS_IGNORED: &[&str] = &["node_modules", ".git"];

/// One applied batch of changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Files reported by the filesystem
    pub changed: Vec<PathBuf>,
    /// Files whose cached builds were dropped
    pub invalidated: Vec<PathBuf>,
}

/// Watches a frontend root and keeps the build cache fresh
///
/// Dropping the watcher stops it.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    batches: mpsc::UnboundedReceiver<Invalidation>,
}

impl FileWatcher {
    /// Start watching `root`; must be called inside a tokio runtime
    ///
    /// `out_dir` is the builder's output directory, which is ignored so
    /// emitted assets don't trigger rebuilds.
    pub fn spawn(
        root: &Path,
        cache: Arc<BuildCache>,
        config: &WatchConfig,
        out_dir: &Path,
    ) -> RendrResult<Self> {
        let root = paths::absolutize(root)?;
        let ignored = ignored_segments(config, out_dir);

        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in relevant_paths(&event, &ignored) {
                    let _ = tx.send(path);
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        })
        .map_err(|e| RendrError::Watch(format!("failed to initialize watcher: {e}")))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| RendrError::Watch(format!("failed to watch {}: {e}", root.display())))?;
        info!("Watching {}", root.display());

        let (batch_tx, batches) = mpsc::unbounded_channel();
        let debounce = Duration::from_millis(config.debounce_ms);
        let task = tokio::spawn(run(rx, cache, debounce, batch_tx));

        Ok(Self {
            _watcher: watcher,
            task,
            batches,
        })
    }

    /// Wait for the next applied batch
    pub async fn next(&mut self) -> Option<Invalidation> {
        self.batches.recv().await
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<PathBuf>,
    cache: Arc<BuildCache>,
    debounce: Duration,
    batches: mpsc::UnboundedSender<Invalidation>,
) {
    while let Some(first) = rx.recv().await {
        let mut changed = BTreeSet::from([first]);
        collect_batch(&mut rx, &mut changed, debounce).await;

        let batch = apply(&cache, changed);
        if !batch.invalidated.is_empty() {
            info!(
                changed = batch.changed.len(),
                invalidated = batch.invalidated.len(),
                "Invalidated cached builds"
            );
        }
        let _ = batches.send(batch);
    }
    debug!("File watcher channel closed");
}

/// Keep receiving until `window` passes with no new event
async fn collect_batch(
    rx: &mut mpsc::UnboundedReceiver<PathBuf>,
    changed: &mut BTreeSet<PathBuf>,
    window: Duration,
) {
    let sleep = tokio::time::sleep_until(Instant::now() + window);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => break,
            maybe = rx.recv() => match maybe {
                Some(path) => {
                    changed.insert(path);
                    sleep.as_mut().reset(Instant::now() + window);
                }
                None => break,
            }
        }
    }
}

fn apply(cache: &BuildCache, changed: BTreeSet<PathBuf>) -> Invalidation {
    let mut invalidated = BTreeSet::new();
    for path in &changed {
        invalidated.extend(cache.invalidate(path));
    }
    Invalidation {
        changed: changed.into_iter().collect(),
        invalidated: invalidated.into_iter().collect(),
    }
}

fn ignored_segments(config: &WatchConfig, out_dir: &Path) -> Vec<String> {
    let mut segments: Vec<String> = ALWAYS_IGNORED.iter().map(|s| s.to_string()).collect();
    if let Some(name) = out_dir.file_name() {
        segments.push(name.to_string_lossy().into_owned());
    }
    segments.extend(config.ignore.iter().cloned());
    segments
}

fn relevant_paths(event: &Event, ignored: &[String]) -> Vec<PathBuf> {
    if event.kind.is_access() {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| !paths::has_segment(path, ignored))
        .map(|path| paths::normalize(path))
        .collect()
}
