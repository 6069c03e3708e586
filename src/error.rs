//! Error types for the job level and for user callbacks.
//!

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::worker::ExitStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Returned by map and reduce callbacks.
pub type TaskResult = std::result::Result<(), TaskError>;

/// Failure detail attached to a map or reduce callback that did not
/// succeed. Callbacks doing I/O can propagate errors with `?`.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl TaskError {
    pub fn msg<S: Into<String>>(msg: S) -> TaskError {
        TaskError::Other(msg.into())
    }
}

/// Everything that can end a job. There is no partial success: the first
/// of these aborts the whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// The spec carries an empty output path.
    #[error("no output path configured")]
    MissingOutput,

    #[error("cannot read input file {path:?}: {source}")]
    InputUnreadable { path: PathBuf, source: io::Error },

    #[error("input file {0:?} is empty")]
    EmptyInput(PathBuf),

    #[error("split planning failed: {0}")]
    Plan(#[source] io::Error),

    #[error("cannot create intermediate artifact for split {split}: {source}")]
    Artifact { split: usize, source: io::Error },

    #[error("cannot spawn worker {name}: {source}")]
    Spawn { name: String, source: io::Error },

    #[error("map worker for split {split} {status}")]
    MapWorker { split: usize, status: ExitStatus },

    #[error("reduce worker {status}")]
    ReduceWorker { status: ExitStatus },
}
