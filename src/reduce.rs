//! Implements the reduce phase.
//!
//! A single worker, spawned only after every map worker has exited
//! successfully. It rediscovers the intermediate artifacts through the
//! store's index-based naming; nothing is handed over in memory.

use std::fs;
use std::io::{Read, Write};
use std::thread;

use log::{debug, info};

use crate::error::{Error, Result, TaskResult};
use crate::job::{JobResult, JobSpec};
use crate::store::SplitStore;
use crate::worker;

/// Spawns the reduce worker over all `splits` artifacts and waits for
/// it. Any non-success outcome fails the job.
pub(crate) fn run<U, S>(spec: &JobSpec<U, S>, splits: usize, result: &mut JobResult) -> Result<()>
where
    U: Sync,
    S: SplitStore,
{
    info!("reduce phase: {} artifacts", splits);

    thread::scope(|scope| {
        let handle = worker::spawn(scope, String::from("reduce"), move || {
            reduce_worker(spec, splits)
        })?;
        result.record_reduce_worker(handle.id().clone());

        let status = handle.wait();
        debug!("reduce worker {}", status);
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::ReduceWorker { status })
        }
    })
}

/// Body of the reduce worker: creates the result file, opens every
/// artifact read-only in split order, and runs the reduce callback over
/// the ordered inputs.
fn reduce_worker<U, S: SplitStore>(spec: &JobSpec<U, S>, splits: usize) -> TaskResult {
    let mut out = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&spec.output)?;

    let mut inputs: Vec<Box<dyn Read + Send>> = Vec::with_capacity(splits);
    for split in 0..splits {
        inputs.push(Box::new(spec.store.open(split)?));
    }

    (spec.reduce_fn)(&mut inputs, &mut out)?;
    out.flush()?;
    Ok(())
}
