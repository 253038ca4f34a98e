//! Error taxonomy shared by the engine and its collaborators.

use thiserror::Error;

use crate::commit::CommitId;

/// Stable classification of a [`StackError`], for callers that render
/// diagnostics or decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UsageConflict,
    NonPositiveCount,
    InvalidName,
    NameCollision,
    NonLinearHistory,
    InsufficientHistory,
    UnreachableTarget,
    UnknownPatch,
    NotCommittable,
    NothingToCommit,
    MissingCommit,
    Storage,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StackError {
    #[error("conflicting options: {0}")]
    UsageConflict(&'static str),

    #[error("count must be positive (got {0})")]
    NonPositiveCount(i64),

    #[error("invalid patch name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("patch `{0}` already exists")]
    NameCollision(String),

    #[error("commit {commit} is not linear history ({parents} parents)")]
    NonLinearHistory { commit: CommitId, parents: usize },

    #[error("only {found} of {requested} requested commits are available above the stack boundary")]
    InsufficientHistory { requested: usize, found: usize },

    #[error("commit {0} is not reachable by linear walk from HEAD above the stack boundary")]
    UnreachableTarget(CommitId),

    #[error("patch `{0}` does not exist")]
    UnknownPatch(String),

    #[error("patch `{0}` cannot be committed: only a bottom run of applied patches can be folded")]
    NotCommittable(String),

    #[error("no applied patches to commit")]
    NothingToCommit,

    #[error("commit not found: {0}")]
    MissingCommit(String),

    #[error("stack is locked by another process (gave up after {attempts} attempts)")]
    Contention { attempts: u32 },

    #[error("corrupt stack state: {0}")]
    Corrupt(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StackError::UsageConflict(_) => ErrorKind::UsageConflict,
            StackError::NonPositiveCount(_) => ErrorKind::NonPositiveCount,
            StackError::InvalidName { .. } => ErrorKind::InvalidName,
            StackError::NameCollision(_) => ErrorKind::NameCollision,
            StackError::NonLinearHistory { .. } => ErrorKind::NonLinearHistory,
            StackError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            StackError::UnreachableTarget(_) => ErrorKind::UnreachableTarget,
            StackError::UnknownPatch(_) => ErrorKind::UnknownPatch,
            StackError::NotCommittable(_) => ErrorKind::NotCommittable,
            StackError::NothingToCommit => ErrorKind::NothingToCommit,
            StackError::MissingCommit(_) => ErrorKind::MissingCommit,
            StackError::Contention { .. }
            | StackError::Corrupt(_)
            | StackError::Storage(_)
            | StackError::Io(_)
            | StackError::Json(_) => ErrorKind::Storage,
        }
    }

    /// Whether retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StackError::Contention { .. })
    }
}

pub type Result<T, E = StackError> = std::result::Result<T, E>;
