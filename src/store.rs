//! Intermediate artifact storage between the map and reduce phases.
//!
//! There is no in-memory handoff between the phases: a map worker writes
//! the artifact for its split, and after the barrier the reduce worker
//! rediscovers it purely from the deterministic index-based name. The
//! store is injected through the job spec so tests can run in their own
//! namespace.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Creates and reopens per-split intermediate artifacts.
///
/// `create` calls for distinct indices are independent and never
/// contend; one artifact is written by exactly one map worker and read
/// by exactly one reduce worker, strictly after the writer has exited.
pub trait SplitStore: Send + Sync {
    type Sink: io::Write + Send + 'static;
    type Source: io::Read + Send + 'static;

    /// Opens a fresh, truncated artifact for `split`, creating it if
    /// absent.
    fn create(&self, split: usize) -> io::Result<Self::Sink>;

    /// Reopens the artifact for `split` read-only. Fails if it was never
    /// created.
    fn open(&self, split: usize) -> io::Result<Self::Source>;
}

/// Keeps artifacts as `mr-<index>.itm` files in one directory. External
/// tooling may rely on that pattern; the engine never deletes the files.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> DirStore {
        DirStore { dir: dir.into() }
    }

    /// Artifacts go to the process working directory.
    pub fn in_working_dir() -> DirStore {
        DirStore::new(".")
    }

    pub fn path_for(&self, split: usize) -> PathBuf {
        self.dir.join(format!("mr-{}.itm", split))
    }
}

impl SplitStore for DirStore {
    type Sink = fs::File;
    type Source = fs::File;

    fn create(&self, split: usize) -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path_for(split))
    }

    fn open(&self, split: usize) -> io::Result<fs::File> {
        fs::OpenOptions::new().read(true).open(self.path_for(split))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    #[test]
    fn names_are_keyed_by_index_only() {
        let store = DirStore::new("/work");
        assert_eq!(store.path_for(0), PathBuf::from("/work/mr-0.itm"));
        assert_eq!(store.path_for(17), PathBuf::from("/work/mr-17.itm"));
    }

    #[test]
    fn create_then_open_round_trips() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path());

        {
            let mut sink = store.create(3).unwrap();
            sink.write_all(b"payload").unwrap();
        }

        let mut content = String::new();
        store.open(3).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "payload");
    }

    #[test]
    fn create_truncates_previous_content() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path());

        store.create(0).unwrap().write_all(b"old old old").unwrap();
        store.create(0).unwrap().write_all(b"new").unwrap();

        let mut content = String::new();
        store.open(0).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "new");
    }

    #[test]
    fn open_fails_for_an_artifact_never_created() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path());
        assert!(store.open(0).is_err());
    }
}
