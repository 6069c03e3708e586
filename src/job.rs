//! Job specification and job result.
//!

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TaskResult;
use crate::store::{DirStore, SplitStore};
use crate::worker::WorkerId;

/// The view of one split handed to a map callback: a fresh reader
/// positioned at the range start and bounded to the range, the range
/// length, and the job's user context. The reader is never shared with
/// another worker.
pub struct DataSplit<'a, U> {
    pub input: io::Take<fs::File>,
    pub len: u64,
    pub user: &'a U,
}

/// Map callback: consumes one split, writing to that split's
/// intermediate artifact.
pub type MapFn<U> = fn(&mut DataSplit<'_, U>, &mut dyn io::Write) -> TaskResult;

/// Reduce callback: consumes the intermediate artifacts in split order
/// (the slice length is the split count), writing the final result.
pub type ReduceFn = fn(&mut [Box<dyn io::Read + Send>], &mut dyn io::Write) -> TaskResult;

/// Everything needed to run one job. Immutable once handed to the
/// controller.
pub struct JobSpec<U, S: SplitStore = DirStore> {
    pub input: PathBuf,
    pub output: PathBuf,
    pub splits: usize,
    pub user: U,
    pub map_fn: MapFn<U>,
    pub reduce_fn: ReduceFn,
    pub store: S,
}

impl<U> JobSpec<U> {
    /// A spec with artifacts in the working directory. `user` is an
    /// opaque value passed unchanged to every map worker.
    pub fn new<P, Q>(
        input: P,
        output: Q,
        user: U,
        map_fn: MapFn<U>,
        reduce_fn: ReduceFn,
    ) -> JobSpec<U>
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        JobSpec {
            input: input.into(),
            output: output.into(),
            splits: 4,
            user,
            map_fn,
            reduce_fn,
            store: DirStore::in_working_dir(),
        }
    }
}

impl<U, S: SplitStore> JobSpec<U, S> {
    /// Requested split count. A hint: the planner downgrades it when the
    /// input is too small.
    ///
    /// Default 4.
    pub fn set_splits(mut self, n: usize) -> JobSpec<U, S> {
        self.splits = n;
        self
    }

    /// Replaces the artifact store, e.g. to relocate intermediate files
    /// into a private directory.
    pub fn set_store<T: SplitStore>(self, store: T) -> JobSpec<U, T> {
        JobSpec {
            input: self.input,
            output: self.output,
            splits: self.splits,
            user: self.user,
            map_fn: self.map_fn,
            reduce_fn: self.reduce_fn,
            store,
        }
    }
}

/// Filled in while the job runs; handed back once it has completed.
/// Never mutated after the controller returns.
#[derive(Debug)]
pub struct JobResult {
    map_workers: Vec<WorkerId>,
    reduce_worker: Option<WorkerId>,
    output: PathBuf,
    elapsed: Duration,
}

impl JobResult {
    pub(crate) fn new(output: PathBuf) -> JobResult {
        JobResult {
            map_workers: Vec::new(),
            reduce_worker: None,
            output,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record_map_worker(&mut self, id: WorkerId) {
        self.map_workers.push(id);
    }

    pub(crate) fn record_reduce_worker(&mut self, id: WorkerId) {
        self.reduce_worker = Some(id);
    }

    pub(crate) fn record_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Map worker identifiers, index-aligned with the split order.
    pub fn map_workers(&self) -> &[WorkerId] {
        &self.map_workers
    }

    pub fn reduce_worker(&self) -> Option<&WorkerId> {
        self.reduce_worker.as_ref()
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed wall-clock time in whole microseconds.
    pub fn elapsed_micros(&self) -> u128 {
        self.elapsed.as_micros()
    }
}
