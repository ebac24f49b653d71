//! Bounded parallel retrieval
//!
//! Each update change becomes one tokio task. A semaphore with one permit per
//! worker bounds how many run at once; a task keeps its permit until it
//! finishes, even after its result has been given up on by a timeout or the
//! `process` future has been dropped. Reclaiming every permit is therefore the
//! same as waiting for every spawned task.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::parser::DependencyChange;
use crate::retrieval::{DiffRetriever, RetrievalError, TempDirRegistry, TempDirTracker};

/// Outcome of retrieving one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageDiff {
    Diff(String),
    Error(String),
}

impl PackageDiff {
    pub fn is_error(&self) -> bool {
        matches!(self, PackageDiff::Error(_))
    }
}

impl From<Result<String, RetrievalError>> for PackageDiff {
    fn from(result: Result<String, RetrievalError>) -> Self {
        match result {
            Ok(diff) => PackageDiff::Diff(diff),
            Err(e) => PackageDiff::Error(e.to_string()),
        }
    }
}

#[derive(Debug)]
struct ProgressState {
    completed: usize,
    total: usize,
}

/// Serializes progress lines so concurrent completions never interleave
#[derive(Debug)]
struct ProgressReporter {
    state: Mutex<ProgressState>,
}

impl ProgressReporter {
    fn new(total: usize) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                completed: 0,
                total,
            }),
        }
    }

    fn record(&self, name: &str, result: &Result<String, RetrievalError>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.completed += 1;
        match result {
            Ok(_) => info!("[{}/{}] Completed {}", state.completed, state.total, name),
            Err(e) => error!(
                "[{}/{}] Failed {}: {}",
                state.completed, state.total, name, e
            ),
        }
    }
}

/// Runs a [`DiffRetriever`] over many changes with bounded concurrency
pub struct ParallelRetriever<R> {
    retriever: Arc<R>,
    registry: Arc<TempDirRegistry>,
    semaphore: Arc<Semaphore>,
    workers: u32,
    timeout: Duration,
}

impl<R: DiffRetriever + 'static> ParallelRetriever<R> {
    /// `registry` must be the tracker `retriever` registers its directories with.
    pub fn new(
        retriever: R,
        registry: Arc<TempDirRegistry>,
        workers: usize,
        timeout: Duration,
    ) -> Self {
        let workers = u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
        debug!(
            "Starting parallel retriever with {} workers, {:?} timeout",
            workers, timeout
        );
        Self {
            retriever: Arc::new(retriever),
            registry,
            semaphore: Arc::new(Semaphore::new(workers as usize)),
            workers,
            timeout,
        }
    }

    /// Retrieves the diff of every update in `changes`.
    ///
    /// Additions and removals are skipped. A failing or timed-out package gets
    /// an error entry and never affects the others.
    pub async fn process(&self, changes: &[DependencyChange]) -> BTreeMap<String, PackageDiff> {
        let mut updates: BTreeMap<&str, &DependencyChange> = BTreeMap::new();
        for change in changes {
            if change.is_update() {
                updates.insert(change.name.as_str(), change);
            } else {
                debug!(
                    "Skipping {}: {} is not a version update",
                    change.name,
                    change.kind().map_or("empty change", |kind| kind.as_str())
                );
            }
        }

        let progress = ProgressReporter::new(updates.len());
        let mut pending: FuturesUnordered<_> = updates
            .into_values()
            .map(|change| async move {
                let result = self.run_one(change.clone()).await;
                (change.name.clone(), result)
            })
            .collect();

        let mut results = BTreeMap::new();
        while let Some((name, result)) = pending.next().await {
            progress.record(&name, &result);
            results.insert(name, PackageDiff::from(result));
        }
        results
    }

    async fn run_one(&self, change: DependencyChange) -> Result<String, RetrievalError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| RetrievalError::TaskFailed("worker pool is shut down".to_string()))?;

        let name = change.name.clone();
        let retriever = Arc::clone(&self.retriever);
        let mut handle = tokio::spawn(async move {
            let _permit = permit;
            retriever.get_diff(&change).await
        });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(joined) => joined?,
            Err(_) => {
                // the task keeps running detached and still holds its permit
                warn!("Giving up on {} after {:?}", name, self.timeout);
                Err(RetrievalError::Timeout(self.timeout))
            }
        }
    }

    /// Waits until no retrieval task is running, shuts the pool down and
    /// deletes every tracked directory. Later calls only repeat the deletion,
    /// which is a no-op.
    pub async fn cleanup(&self) {
        let in_flight = (self.workers as usize).saturating_sub(self.semaphore.available_permits());
        if in_flight > 0 {
            info!("Waiting for {} running retrievals to finish", in_flight);
        }
        match self.semaphore.acquire_many(self.workers).await {
            Ok(all) => {
                self.semaphore.close();
                drop(all);
            }
            Err(_) => debug!("Worker pool already shut down"),
        }

        self.registry.cleanup();
    }
}

impl<R: Send + Sync> TempDirTracker for ParallelRetriever<R> {
    fn track_temp_dir(&self, path: &Path) {
        self.registry.track_temp_dir(path);
    }
}
