//! Concurrent directory loader
//!
//! A scan lists the files of a directory that some [`FormatAdapter`] accepts,
//! submits one parse-and-repair job per file to a bounded `rayon` pool and
//! delivers the results to a [`TrackLoadListener`] in submission order (file
//! name order), not completion order. A slow file therefore holds back the
//! delivery of files after it.
//!
//! Starting a new scan cancels the previous one. Every listener callback runs
//! under the loader's delivery gate, which only lets the newest scan through,
//! so nothing of a superseded scan can reach the listener after the newer
//! scan's [`TrackLoadListener::start_reading`].

use crate::adapter::{AdapterRegistry, FormatAdapter};
use crate::utils::{GeoDistance, Haversine};
use crate::{DataError, Result, TrackCollection, repair_track};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

/// Cooperative cancellation flag shared between a scan and its jobs
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(DataError::Cancelled)` once [`cancel`](Self::cancel) was called
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DataError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Result of processing one file
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(TrackCollection),
    Failed(DataError),
    Cancelled,
}

impl From<Result<TrackCollection>> for FileOutcome {
    fn from(result: Result<TrackCollection>) -> Self {
        match result {
            Ok(collection) => FileOutcome::Loaded(collection),
            Err(err) if err.is_cancellation() => FileOutcome::Cancelled,
            Err(err) => FileOutcome::Failed(err),
        }
    }
}

/// Receiver of scan progress
///
/// Callbacks are invoked from the loader's controlling thread while it holds
/// the delivery gate. They must not call back into the same [`TrackLoader`]
/// (e.g. start a new scan), which would deadlock; hand such requests off to
/// another thread instead.
pub trait TrackLoadListener: Send + Sync {
    /// A scan started; always the first callback of a scan
    fn start_reading(&self);

    /// Whether a file found in the directory should be loaded at all
    fn accept_file(&self, _path: &Path) -> bool {
        true
    }

    /// One file was parsed and repaired
    fn track_loaded(&self, path: &Path, collection: TrackCollection);

    /// One file (or the directory listing) failed; the scan goes on
    fn report_error(&self, message: &str, cause: &DataError);

    /// A file was not loaded because the scan was cancelled
    fn read_cancelled(&self, _path: &Path) {}

    /// Every file of the scan was delivered; always the last callback
    fn finish_reading(&self);
}

/// Loader tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoaderConfig {
    /// Worker threads parsing and repairing files in parallel
    pub workers: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    generation: u64,
    active: Option<CancellationToken>,
}

/// Loads every track file of a directory on a bounded worker pool
pub struct TrackLoader {
    pool: Arc<rayon::ThreadPool>,
    adapters: Arc<AdapterRegistry>,
    distance: Arc<dyn GeoDistance>,
    state: Arc<Mutex<LoaderState>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackLoader {
    /// Loader with the GPX and TCX adapters and haversine distances
    pub fn new(config: LoaderConfig) -> Result<Self> {
        Self::with_parts(config, AdapterRegistry::with_defaults(), Arc::new(Haversine))
    }

    pub fn with_parts(
        config: LoaderConfig,
        adapters: AdapterRegistry,
        distance: Arc<dyn GeoDistance>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|index| format!("track-worker-{index}"))
            .panic_handler(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Track worker panicked: {}", message);
            })
            .build()?;

        Ok(Self {
            pool: Arc::new(pool),
            adapters: Arc::new(adapters),
            distance,
            state: Arc::new(Mutex::new(LoaderState::default())),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Start scanning `dir`, cancelling any scan still in flight
    ///
    /// Returns as soon as the controlling thread is running; progress is
    /// reported to `listener`.
    pub fn load(
        &self,
        dir: impl Into<PathBuf>,
        listener: Arc<dyn TrackLoadListener>,
    ) -> Result<ScanHandle> {
        let token = CancellationToken::new();
        let generation = {
            let mut state = lock(&self.state);
            if let Some(previous) = state.active.take() {
                tracing::debug!("Cancelling scan {} in favour of a new one", state.generation);
                previous.cancel();
            }
            state.generation += 1;
            state.active = Some(token.clone());
            state.generation
        };

        let scan = Scan {
            generation,
            dir: dir.into(),
            token: token.clone(),
            listener,
            state: Arc::clone(&self.state),
            pool: Arc::clone(&self.pool),
            adapters: Arc::clone(&self.adapters),
            distance: Arc::clone(&self.distance),
        };

        let thread = std::thread::Builder::new()
            .name(format!("track-scan-{generation}"))
            .spawn(move || scan.run())?;

        Ok(ScanHandle { token, thread })
    }

    /// Cancel the scan in flight, if any
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.state).active.take() {
            token.cancel();
        }
    }
}

impl std::fmt::Debug for TrackLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackLoader")
            .field("workers", &self.workers())
            .field("adapters", &self.adapters)
            .finish()
    }
}

/// Handle to one running scan
#[derive(Debug)]
pub struct ScanHandle {
    token: CancellationToken,
    thread: JoinHandle<()>,
}

impl ScanHandle {
    /// Stop the scan; files whose jobs have not finished are reported as cancelled
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the controlling thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the controlling thread has exited
    pub fn wait(self) {
        if self.thread.join().is_err() {
            tracing::error!("Track scan thread panicked");
        }
    }
}

/// Everything the controlling thread of one scan needs
struct Scan {
    generation: u64,
    dir: PathBuf,
    token: CancellationToken,
    listener: Arc<dyn TrackLoadListener>,
    state: Arc<Mutex<LoaderState>>,
    pool: Arc<rayon::ThreadPool>,
    adapters: Arc<AdapterRegistry>,
    distance: Arc<dyn GeoDistance>,
}

type Pending = (PathBuf, oneshot::Receiver<FileOutcome>);

impl Scan {
    fn run(self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("TrackLoader::scan");

        if !self.deliver(|listener| listener.start_reading()) {
            return;
        }

        let files = match list_files(&self.dir, &self.adapters) {
            Ok(files) => files,
            Err(err) => {
                let message = format!("Could not list {}", self.dir.display());
                self.deliver(|listener| listener.report_error(&message, &err));
                self.finish();
                return;
            }
        };

        let mut accepted = Vec::with_capacity(files.len());
        for (path, adapter) in files {
            let mut accept = false;
            if !self.deliver(|listener| accept = listener.accept_file(&path)) {
                return;
            }
            if accept {
                accepted.push((path, adapter));
            }
        }
        let files = accepted;
        tracing::debug!(
            "Scan {}: {} file(s) in {}",
            self.generation,
            files.len(),
            self.dir.display()
        );

        let pending = self.submit(files);
        if self.collect(pending) {
            self.finish();
        }
    }

    /// Queue one job per file and keep the receivers in submission order
    fn submit(&self, files: Vec<(PathBuf, Arc<dyn FormatAdapter>)>) -> Vec<Pending> {
        files
            .into_iter()
            .map(|(path, adapter)| {
                let (tx, rx) = oneshot::channel();
                let job_path = path.clone();
                let distance = Arc::clone(&self.distance);
                let token = self.token.clone();

                self.pool.spawn(move || {
                    let outcome = process_file(&job_path, adapter.as_ref(), distance.as_ref(), &token);
                    // The receiver is gone when the scan was superseded
                    let _ = tx.send(outcome.into());
                });

                (path, rx)
            })
            .collect()
    }

    /// Deliver results in submission order; `false` once superseded
    fn collect(&self, pending: Vec<Pending>) -> bool {
        for (path, mut rx) in pending {
            let outcome = if self.token.is_cancelled() {
                // Jobs that already finished keep their result; the rest are not waited for
                rx.try_recv().unwrap_or(FileOutcome::Cancelled)
            } else {
                rx.blocking_recv()
                    .unwrap_or(FileOutcome::Failed(DataError::TaskLost))
            };

            let delivered = self.deliver(|listener| match outcome {
                FileOutcome::Loaded(collection) => listener.track_loaded(&path, collection),
                FileOutcome::Failed(err) => {
                    let message = format!("Could not load {}", path.display());
                    tracing::warn!("{}: {}", message, err);
                    listener.report_error(&message, &err);
                }
                FileOutcome::Cancelled => listener.read_cancelled(&path),
            });
            if !delivered {
                tracing::debug!("Scan {} superseded, dropping remaining results", self.generation);
                return false;
            }
        }
        true
    }

    /// Run `callback` if this scan is still the newest one
    fn deliver(&self, callback: impl FnOnce(&dyn TrackLoadListener)) -> bool {
        let state = lock(&self.state);
        if state.generation != self.generation {
            return false;
        }
        callback(self.listener.as_ref());
        true
    }

    fn finish(&self) {
        let mut state = lock(&self.state);
        if state.generation != self.generation {
            return;
        }
        state.active = None;
        self.listener.finish_reading();
    }
}

/// Files of `dir` with a registered adapter, sorted by path
fn list_files(
    dir: &Path,
    adapters: &AdapterRegistry,
) -> Result<Vec<(PathBuf, Arc<dyn FormatAdapter>)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(adapter) = adapters.find(&path) {
            files.push((path, adapter));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Parse one file and repair all of its tracks
#[cfg_attr(feature = "profiling", profiling::function)]
fn process_file(
    path: &Path,
    adapter: &dyn FormatAdapter,
    distance: &dyn GeoDistance,
    cancel: &CancellationToken,
) -> Result<TrackCollection> {
    cancel.check()?;

    let mut reader = BufReader::new(File::open(path)?);
    let mut collection = adapter.parse(&mut reader)?;
    cancel.check()?;

    let dropped = collection.remove_empty_tracks();
    for track in collection.tracks_mut() {
        repair_track(track, distance, cancel)?;
    }
    cancel.check()?;

    tracing::debug!(
        "Loaded {}: {} track(s), {} point(s), {} empty track(s) dropped",
        path.display(),
        collection.tracks().len(),
        collection.point_count(),
        dropped
    );
    Ok(collection)
}

fn lock(state: &Mutex<LoaderState>) -> MutexGuard<'_, LoaderState> {
    // A listener panic poisons the gate; the state itself stays consistent
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
