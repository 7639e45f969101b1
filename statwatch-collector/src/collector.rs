//! The Collector: periodic sampling of monitored sources.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use statwatch_types::{DbStats, Snapshot, SourceKey};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::handle::SourceHandle;
use crate::state::{SourceRegistry, SourceState};
use crate::summary::{self, SUMMARY_EVERY};
use crate::{
    BatchStore, CollectError, ConnectError, Connection, Connector, RawDocument, StatusSink,
    StoreError, Target,
};

/// Default time between two samples of one source.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on every connector call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of iterations of [`Collector::observe_storage`].
pub const OBSERVE_ITERATIONS: usize = 10;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

enum Command<'a> {
    ServerStatus,
    DbStats(&'a str),
}

/// Why a cycle recorded nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The target could not be reached.
    Unavailable(String),
    /// The diagnostic command failed.
    Command(String),
    /// A connector call exceeded the request timeout.
    Timeout,
}

impl From<ConnectError> for SkipReason {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Unavailable(msg) => SkipReason::Unavailable(msg),
            ConnectError::Command(msg) => SkipReason::Command(msg),
            ConnectError::Timeout => SkipReason::Timeout,
        }
    }
}

/// Result of one collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A snapshot was appended to the source's buffers.
    Recorded {
        /// 1-based sample ordinal for the source.
        ordinal: u64,
        /// `false` when the document did not decode and a zeroed snapshot was recorded.
        decoded: bool,
        /// Batch file written by this cycle, if the pending buffer was flushed.
        flushed: Option<PathBuf>,
        /// A flush was due but failed; the pending buffer was kept.
        flush_failed: bool,
        /// A live summary was emitted.
        summary: bool,
    },
    /// Nothing was recorded this cycle.
    Skipped(SkipReason),
}

/// Counters accumulated by a continuous collection unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub recorded: u64,
    pub skipped: u64,
    pub decode_failures: u64,
    pub flushes: u64,
    pub flush_failures: u64,
}

impl CollectionStats {
    fn observe(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Recorded {
                decoded,
                flushed,
                flush_failed,
                ..
            } => {
                self.recorded += 1;
                if !decoded {
                    self.decode_failures += 1;
                }
                if flushed.is_some() {
                    self.flushes += 1;
                }
                if *flush_failed {
                    self.flush_failures += 1;
                }
            }
            CycleOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// One storage-growth observation from [`Collector::observe_storage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageRate {
    pub from_mb: f64,
    pub to_mb: f64,
    pub mb_per_sec: f64,
}

/// Samples monitored sources and feeds their buffers.
///
/// A collector is cheap to clone; clones share the registry, store and
/// status sink. Each call to [`start`](Collector::start) runs one independent
/// collection unit for one target.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use statwatch_collector::{
///     BatchStore, Collector, ConnectError, Connection, Connector, StatusSink, Target,
/// };
/// use statwatch_types::SourceKey;
///
/// #[derive(Debug)]
/// struct Driver;
///
/// #[async_trait]
/// impl Connector for Driver {
///     async fn acquire(&self, target: &Target) -> Result<Box<dyn Connection>, ConnectError> {
///         Err(ConnectError::Unavailable(target.uri.clone()))
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let collector = Collector::builder(Driver)
///         .interval(Duration::from_secs(10))
///         .store(BatchStore::in_temp_dir())
///         .status(StatusSink::Log)
///         .live_summary(true)
///         .build();
///
///     let target = Target::new(SourceKey::standalone("db1:27017"), "mongodb://db1:27017");
///     let handle = collector.start(target);
///
///     tokio::time::sleep(Duration::from_secs(60)).await;
///     let stats = handle.stop_and_wait().await.unwrap();
///     println!("recorded {} samples", stats.recorded);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Collector {
    connector: Arc<dyn Connector>,
    registry: Arc<SourceRegistry>,
    store: BatchStore,
    status: StatusSink,
    interval: Duration,
    request_timeout: Duration,
    live_summary: bool,
    verbose: bool,
    observe_iterations: usize,
}

impl Collector {
    /// Create a builder around `connector`.
    pub fn builder(connector: impl Connector + 'static) -> CollectorBuilder {
        CollectorBuilder::new(Arc::new(connector))
    }

    /// The registry holding every monitored source.
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// The batch store pending snapshots are flushed to.
    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    /// A handle onto a registered source.
    pub fn source(&self, key: &SourceKey) -> Option<SourceHandle> {
        self.registry.get(key).map(SourceHandle::new)
    }

    /// Run one collection cycle for `target`.
    ///
    /// Connection and command failures skip the cycle. A document that does
    /// not decode is recorded as a zeroed snapshot. Flush failures are logged
    /// and leave the pending buffer for the next trigger.
    pub async fn poll_once(&self, target: &Target) -> CycleOutcome {
        let state = self.registry.register(&target.key);

        let raw = match self.fetch(target, Command::ServerStatus).await {
            Ok(raw) => raw,
            Err(err) => {
                debug!(source = %target.key, error = %err, "skipping cycle");
                return CycleOutcome::Skipped(err.into());
            }
        };

        let (snapshot, decoded) = Snapshot::decode_or_default(&raw);
        if !decoded {
            warn!(source = %target.key, "status document did not decode, recording zeroed snapshot");
        }

        let recorded = state.record(snapshot);

        let mut flushed = None;
        let mut flush_failed = false;
        if recorded.needs_flush() {
            match self.flush_pending(state.clone()).await {
                Ok(path) => flushed = path,
                Err(err) => {
                    warn!(source = %target.key, error = %err, "flush failed, keeping pending snapshots");
                    flush_failed = true;
                }
            }
        }

        let summarized = self.live_summary && summary::is_summary_sample(recorded.ordinal);
        if summarized {
            let (latest, earlier) = state.latest_and_back(SUMMARY_EVERY as usize);
            if let Some(current) = latest {
                for line in summary::live_summary(&target.key, &current, earlier.as_ref()) {
                    self.status.emit(line);
                }
            }
        }

        CycleOutcome::Recorded {
            ordinal: recorded.ordinal,
            decoded,
            flushed,
            flush_failed,
            summary: summarized,
        }
    }

    /// Start continuous collection of `target` on a background task.
    ///
    /// The unit samples immediately, then once per interval until stopped.
    /// A stop request is honoured at the sleep between cycles, never in the
    /// middle of one. On stop the unit flushes whatever is pending and
    /// unregisters the source.
    pub fn start(&self, target: Target) -> CollectionHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let collector = self.clone();

        if self.verbose {
            self.status
                .emit(format!("collects every {} second(s)", self.interval.as_secs()));
        }
        self.status.emit(format!("[{}] collection begins", target.key));

        let task = tokio::spawn(async move {
            let mut stats = CollectionStats::default();

            loop {
                let outcome = collector.poll_once(&target).await;
                stats.observe(&outcome);

                tokio::select! {
                    _ = tokio::time::sleep(collector.interval) => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow_and_update() {
                            break;
                        }
                    }
                }
            }

            collector.finish(&target.key, &mut stats).await;
            stats
        });

        CollectionHandle { stop_tx, task }
    }

    async fn finish(&self, key: &SourceKey, stats: &mut CollectionStats) {
        if let Some(state) = self.registry.get(key) {
            match self.flush_pending(state).await {
                Ok(Some(_)) => stats.flushes += 1,
                Ok(None) => {}
                Err(err) => {
                    warn!(source = %key, error = %err, "final flush failed");
                    stats.flush_failures += 1;
                }
            }
        }
        self.registry.unregister(key);
        debug!(source = %key, recorded = stats.recorded, skipped = stats.skipped, "collection stopped");
    }

    /// Observe storage growth of database `db` for a fixed number of iterations.
    ///
    /// The first successful sample seeds the comparison. Each later sample
    /// reports the growth rate to the status sink when time has passed and
    /// the size did not shrink. Nothing is persisted.
    pub async fn observe_storage(&self, target: &Target, db: &str) -> Vec<StorageRate> {
        self.status
            .emit(format!("[{}] collection begins", target.key));

        let mut previous: Option<(f64, Instant)> = None;
        let mut rates = Vec::new();

        for iteration in 0..self.observe_iterations {
            match self.fetch(target, Command::DbStats(db)).await {
                Ok(raw) => {
                    let now = Instant::now();
                    let size_mb = DbStats::decode(&raw).unwrap_or_default().data_size as f64 / BYTES_PER_MB;

                    if let Some((prev_mb, prev_at)) = previous {
                        let secs = now.duration_since(prev_at).as_secs_f64();
                        let rate = (size_mb - prev_mb) / secs;
                        if secs > 0.0 && rate >= 0.0 {
                            self.status.emit(format!(
                                "[{}] Storage: {:.1} -> {:.1}, rate: {:.1} MB/sec",
                                target.key, prev_mb, size_mb, rate
                            ));
                            rates.push(StorageRate {
                                from_mb: prev_mb,
                                to_mb: size_mb,
                                mb_per_sec: rate,
                            });
                        }
                    }
                    previous = Some((size_mb, now));
                }
                Err(err) => {
                    debug!(source = %target.key, db, error = %err, "skipping storage sample");
                }
            }

            if iteration + 1 < self.observe_iterations {
                tokio::time::sleep(self.interval).await;
            }
        }

        self.status
            .emit(format!("[{}] storage observation exiting...", target.key));
        rates
    }

    /// Take one sample of `target` now and flush it with anything pending.
    ///
    /// Unlike [`poll_once`](Collector::poll_once), failures are returned to
    /// the caller. Returns the batch file written.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use async_trait::async_trait;
    /// # use statwatch_collector::{
    /// #     BatchStore, Collector, ConnectError, Connection, Connector, RawDocument, Target,
    /// # };
    /// # use statwatch_types::SourceKey;
    /// #[derive(Debug)]
    /// struct Fixed;
    ///
    /// struct FixedConnection;
    ///
    /// #[async_trait]
    /// impl Connection for FixedConnection {
    ///     async fn server_status(&mut self) -> Result<RawDocument, ConnectError> {
    ///         Ok(br#"{"host": "db1:27017", "opcounters": {"insert": 5}}"#.to_vec())
    ///     }
    ///
    ///     async fn db_stats(&mut self, _db: &str) -> Result<RawDocument, ConnectError> {
    ///         Ok(br#"{"dataSize": 0}"#.to_vec())
    ///     }
    /// }
    ///
    /// #[async_trait]
    /// impl Connector for Fixed {
    ///     async fn acquire(&self, _target: &Target) -> Result<Box<dyn Connection>, ConnectError> {
    ///         Ok(Box::new(FixedConnection))
    ///     }
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let dir = tempfile::tempdir().unwrap();
    /// let collector = Collector::builder(Fixed).store(BatchStore::new(dir.path())).build();
    /// let target = Target::new(SourceKey::standalone("db1:27017"), "mongodb://db1:27017");
    ///
    /// let path = collector.snapshot_now(&target).await.unwrap();
    /// assert_eq!(BatchStore::read_all(path).unwrap()[0].opcounters.insert, 5);
    /// # });
    /// ```
    pub async fn snapshot_now(&self, target: &Target) -> Result<PathBuf, CollectError> {
        let raw = self.fetch(target, Command::ServerStatus).await?;
        let (snapshot, decoded) = Snapshot::decode_or_default(&raw);
        if !decoded {
            warn!(source = %target.key, "status document did not decode, recording zeroed snapshot");
        }

        let state = self.registry.register(&target.key);
        state.record(snapshot);
        let path = self.flush_pending(state).await?;
        Ok(path.unwrap_or_else(|| self.store.path_for(&target.key)))
    }

    /// Flush `state` on the blocking pool so file I/O never stalls other units.
    async fn flush_pending(&self, state: Arc<SourceState>) -> Result<Option<PathBuf>, StoreError> {
        let store = self.store.clone();
        off_runtime(move || state.flush(&store)).await?
    }

    /// Acquire a connection, run one command, release the connection.
    async fn fetch(&self, target: &Target, command: Command<'_>) -> Result<RawDocument, ConnectError> {
        let mut conn = self.bounded(self.connector.acquire(target)).await?;
        let result = match command {
            Command::ServerStatus => self.bounded(conn.server_status()).await,
            Command::DbStats(db) => self.bounded(conn.db_stats(db)).await,
        };
        conn.release();
        result
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ConnectError>>,
    ) -> Result<T, ConnectError> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .unwrap_or(Err(ConnectError::Timeout))
    }
}

/// Builder for a [`Collector`].
#[derive(Debug)]
pub struct CollectorBuilder {
    connector: Arc<dyn Connector>,
    registry: Option<Arc<SourceRegistry>>,
    store: Option<BatchStore>,
    status: StatusSink,
    interval: Option<Duration>,
    request_timeout: Option<Duration>,
    live_summary: bool,
    verbose: bool,
    observe_iterations: Option<usize>,
}

impl CollectorBuilder {
    fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            registry: None,
            store: None,
            status: StatusSink::default(),
            interval: None,
            request_timeout: None,
            live_summary: false,
            verbose: false,
            observe_iterations: None,
        }
    }

    /// Time between samples. Defaults to 10 seconds.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Bound on each connector call. Defaults to 30 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Emit once-a-minute summaries to the status sink.
    pub fn live_summary(mut self, enabled: bool) -> Self {
        self.live_summary = enabled;
        self
    }

    /// Emit extra status messages.
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Where pending snapshots are flushed. Defaults to the temp directory.
    pub fn store(mut self, store: BatchStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Where live-status messages go. Defaults to discarding them.
    pub fn status(mut self, status: StatusSink) -> Self {
        self.status = status;
        self
    }

    /// Share an existing registry instead of creating one.
    pub fn registry(mut self, registry: Arc<SourceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Iterations of [`Collector::observe_storage`]. Defaults to 10.
    pub fn observe_iterations(mut self, iterations: usize) -> Self {
        self.observe_iterations = Some(iterations);
        self
    }

    pub fn build(self) -> Collector {
        Collector {
            connector: self.connector,
            registry: self.registry.unwrap_or_default(),
            store: self.store.unwrap_or_else(BatchStore::in_temp_dir),
            status: self.status,
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            live_summary: self.live_summary,
            verbose: self.verbose,
            observe_iterations: self.observe_iterations.unwrap_or(OBSERVE_ITERATIONS),
        }
    }
}

/// Handle for a running collection unit.
///
/// Dropping the handle also stops the unit.
#[derive(Debug)]
pub struct CollectionHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<CollectionStats>,
}

impl CollectionHandle {
    /// Ask the unit to stop at its next sleep.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stop the unit and wait for its final flush.
    pub async fn stop_and_wait(self) -> Result<CollectionStats, tokio::task::JoinError> {
        self.stop();
        self.task.await
    }

    /// Whether the unit has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run blocking work on the runtime's blocking pool.
async fn off_runtime<T, F>(work: F) -> Result<T, tokio::task::JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await
}
