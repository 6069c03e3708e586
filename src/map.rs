//! Implements the map phase.
//!
//! One isolated worker per split, all spawned up front, all drained
//! before the phase reports its outcome.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::thread;

use log::{debug, info};

use crate::error::{Error, Result, TaskResult};
use crate::job::{DataSplit, JobResult, JobSpec};
use crate::split::SplitRange;
use crate::store::SplitStore;
use crate::worker::{self, ExitStatus};

/// Fans out one worker per range, then waits for every one in split
/// order. A failed artifact creation or spawn aborts the remaining
/// spawns; already-running workers are still waited on so none is left
/// orphaned. The first failing split decides the error.
pub(crate) fn run<U, S>(
    spec: &JobSpec<U, S>,
    ranges: &[SplitRange],
    result: &mut JobResult,
) -> Result<()>
where
    U: Sync,
    S: SplitStore,
{
    info!("map phase: {} splits", ranges.len());

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(ranges.len());
        let mut abort: Option<Error> = None;

        for (split, range) in ranges.iter().enumerate() {
            // The sink is created here and moved into the worker, so no
            // writing handle to the artifact stays behind on this side
            // of the isolation boundary.
            let sink = match spec.store.create(split) {
                Ok(sink) => sink,
                Err(e) => {
                    abort = Some(Error::Artifact { split, source: e });
                    break;
                }
            };
            let range = *range;
            match worker::spawn(scope, format!("map/{}", split), move || {
                map_worker(spec, range, sink)
            }) {
                Ok(handle) => {
                    result.record_map_worker(handle.id().clone());
                    handles.push(handle);
                }
                Err(e) => {
                    abort = Some(e);
                    break;
                }
            }
        }

        let mut first_failure: Option<(usize, ExitStatus)> = None;
        for (split, handle) in handles.into_iter().enumerate() {
            let status = handle.wait();
            debug!("map worker {} {}", split, status);
            if !status.is_success() && first_failure.is_none() {
                first_failure = Some((split, status));
            }
        }

        if let Some(e) = abort {
            return Err(e);
        }
        if let Some((split, status)) = first_failure {
            return Err(Error::MapWorker { split, status });
        }
        Ok(())
    })
}

/// Body of one map worker. Opens its own handle onto the input so the
/// read cursor is never shared with the spawner or a sibling.
fn map_worker<U, S: SplitStore>(
    spec: &JobSpec<U, S>,
    range: SplitRange,
    mut sink: S::Sink,
) -> TaskResult {
    let mut input = fs::File::open(&spec.input)?;
    input.seek(SeekFrom::Start(range.start))?;
    let mut split = DataSplit {
        input: input.take(range.len),
        len: range.len,
        user: &spec.user,
    };
    (spec.map_fn)(&mut split, &mut sink)?;
    sink.flush()?;
    Ok(())
}
