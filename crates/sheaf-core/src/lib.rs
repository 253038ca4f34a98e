pub mod backend;
pub mod canon;
pub mod commit;
pub mod convert;
pub mod engine;
pub mod error;
pub mod hash;
pub mod memory;
pub mod patchname;
pub mod select;
pub mod series;
pub mod walk;

pub use backend::{CommitReader, SeriesStore};
pub use commit::{tree_of, Commit, CommitId};
pub use convert::CommitRequest;
pub use engine::{commit, uncommit, EngineOptions};
pub use error::{ErrorKind, Result, StackError};
pub use patchname::PatchName;
pub use select::{TargetRef, UncommitRequest};
pub use series::{PatchDescriptor, Series};
