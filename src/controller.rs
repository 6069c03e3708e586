//! Controls the execution of one job.
//!
//! Phases run in strict sequence: validate the spec, plan the splits,
//! fan out the map workers, and only once every map worker has
//! succeeded, run the single reduce worker. Any failure is fatal to
//! the whole job; intermediate artifacts already on disk are left
//! untouched.

use std::fs;
use std::time::Instant;

use log::info;

use crate::error::{Error, Result};
use crate::job::{JobResult, JobSpec};
use crate::map;
use crate::reduce;
use crate::split::SplitPlanner;
use crate::store::SplitStore;

/// Top-level driver. A job either returns a fully populated result or
/// the first fatal error; there is no partial-success mode.
pub struct JobController;

impl JobController {
    /// Runs `spec` to completion and reports the elapsed wall-clock
    /// time in the result.
    pub fn run<U, S>(spec: &JobSpec<U, S>) -> Result<JobResult>
    where
        U: Sync,
        S: SplitStore,
    {
        let started = Instant::now();

        let (mut input, size) = Self::validate(spec)?;
        let ranges = SplitPlanner::new(spec.splits).plan(&mut input, size)?;
        drop(input);

        let mut result = JobResult::new(spec.output.clone());
        map::run(spec, &ranges, &mut result)?;
        // Barrier: map::run has waited on every map worker before the
        // reduce worker may exist.
        reduce::run(spec, ranges.len(), &mut result)?;

        result.record_elapsed(started.elapsed());
        info!("job finished in {}us", result.elapsed_micros());
        Ok(result)
    }

    /// Rejects a bad spec before any worker is spawned.
    fn validate<U, S: SplitStore>(spec: &JobSpec<U, S>) -> Result<(fs::File, u64)> {
        if spec.output.as_os_str().is_empty() {
            return Err(Error::MissingOutput);
        }
        let input = fs::File::open(&spec.input).map_err(|e| Error::InputUnreadable {
            path: spec.input.clone(),
            source: e,
        })?;
        let size = input
            .metadata()
            .map_err(|e| Error::InputUnreadable {
                path: spec.input.clone(),
                source: e,
            })?
            .len();
        if size == 0 {
            return Err(Error::EmptyInput(spec.input.clone()));
        }
        Ok((input, size))
    }
}
