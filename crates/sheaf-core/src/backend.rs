//! Narrow interfaces to the commit history and to series persistence.

use crate::commit::CommitId;
use crate::error::Result;
use crate::series::Series;

/// Read-only access to the commit graph and the branch head.
pub trait CommitReader {
    fn commit_parents(&self, id: &CommitId) -> Result<Vec<CommitId>>;

    fn commit_message(&self, id: &CommitId) -> Result<String>;

    /// Current commit of the backend ref. Independent of the stack's top.
    fn ref_head(&self) -> Result<CommitId>;
}

/// Atomic read-modify-write access to the stored series.
pub trait SeriesStore {
    /// Snapshot of the current series, without taking the lock.
    fn load_series(&self) -> Result<Series>;

    /// Run `f` over the current series while holding exclusive access and
    /// persist its result. If `f` fails, or persisting fails, the stored
    /// series is left exactly as it was. `op` labels the change in the
    /// stack log.
    fn with_series_transaction<F>(&self, op: &str, f: F) -> Result<()>
    where
        F: FnOnce(Series) -> Result<Series>;
}
