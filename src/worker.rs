//! The isolated worker unit: spawn, wait, classify the exit.
//!
//! A worker is a named scoped thread sharing no mutable state with its
//! spawner or its siblings; it talks to the rest of the job only through
//! the files it was handed when it started. The spawning stage owns the
//! handle and consumes it by waiting.

use std::any::Any;
use std::fmt;
use std::thread;

use crate::error::{Error, TaskResult};

/// Identifier of a spawned worker. It outlives the worker itself and is
/// what ends up in the job result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerId {
    name: String,
}

impl WorkerId {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How a worker terminated. `Failed` means the callback reported an
/// error; `Panicked` means the worker died without reporting anything.
/// Both are fatal to the job, but they are kept apart for diagnostics.
#[derive(Debug)]
pub enum ExitStatus {
    Success,
    Failed(crate::error::TaskError),
    Panicked(String),
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitStatus::Success => write!(f, "completed"),
            ExitStatus::Failed(e) => write!(f, "failed: {}", e),
            ExitStatus::Panicked(msg) => write!(f, "terminated abnormally: {}", msg),
        }
    }
}

/// A running worker. Owned by the stage that spawned it and released by
/// `wait`, which blocks until this specific worker has terminated.
pub struct WorkerHandle<'scope> {
    id: WorkerId,
    join: thread::ScopedJoinHandle<'scope, TaskResult>,
}

impl<'scope> WorkerHandle<'scope> {
    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Blocks until the worker has exited and classifies the outcome.
    pub fn wait(self) -> ExitStatus {
        match self.join.join() {
            Ok(Ok(())) => ExitStatus::Success,
            Ok(Err(e)) => ExitStatus::Failed(e),
            Err(cause) => ExitStatus::Panicked(panic_message(cause)),
        }
    }
}

/// Spawns a named worker inside `scope`. A spawn refusal from the
/// underlying thread builder is fatal to the job.
pub(crate) fn spawn<'scope, 'env, F>(
    scope: &'scope thread::Scope<'scope, 'env>,
    name: String,
    body: F,
) -> std::result::Result<WorkerHandle<'scope>, Error>
where
    F: FnOnce() -> TaskResult + Send + 'scope,
{
    let id = WorkerId { name: name.clone() };
    let join = thread::Builder::new()
        .name(name)
        .spawn_scoped(scope, body)
        .map_err(|e| Error::Spawn {
            name: id.name.clone(),
            source: e,
        })?;
    Ok(WorkerHandle { id, join })
}

fn panic_message(cause: Box<dyn Any + Send>) -> String {
    if let Some(msg) = cause.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = cause.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("unknown panic")
    }
}
