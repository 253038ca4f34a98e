//! Linear first-parent walk from a starting commit toward the stack boundary.

use std::collections::HashSet;

use crate::backend::CommitReader;
use crate::commit::CommitId;
use crate::error::{Result, StackError};

/// A commit yielded by [`CommitWalker`], with the parent it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedCommit {
    pub id: CommitId,
    pub parent: CommitId,
    pub message: String,
}

enum State {
    At(CommitId),
    Done,
}

/// Lazily walks from `start` through single parents, newest first.
///
/// The walk ends when it reaches a commit in the stop set (the stack
/// boundary or a commit already owned by a patch) or a root commit. A commit
/// with more than one parent is reported as [`StackError::NonLinearHistory`]
/// when it would be yielded. After ending or failing, the walker stays done.
pub struct CommitWalker<'r, R: CommitReader + ?Sized> {
    reader: &'r R,
    stop: HashSet<CommitId>,
    state: State,
    yielded: usize,
}

impl<'r, R: CommitReader + ?Sized> CommitWalker<'r, R> {
    pub fn new(reader: &'r R, start: CommitId, stop: HashSet<CommitId>) -> Self {
        Self {
            reader,
            stop,
            state: State::At(start),
            yielded: 0,
        }
    }

    /// Number of commits yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn step(&mut self, id: CommitId) -> Result<Option<WalkedCommit>> {
        if self.stop.contains(&id) {
            tracing::debug!(commit = %id.short(), "walk reached stack boundary");
            return Ok(None);
        }
        let mut parents = self.reader.commit_parents(&id)?;
        match parents.len() {
            0 => {
                tracing::debug!(commit = %id.short(), "walk reached root commit");
                Ok(None)
            }
            1 => {
                let message = self.reader.commit_message(&id)?;
                let parent = parents.remove(0);
                self.state = State::At(parent.clone());
                self.yielded += 1;
                Ok(Some(WalkedCommit {
                    id,
                    parent,
                    message,
                }))
            }
            n => Err(StackError::NonLinearHistory {
                commit: id,
                parents: n,
            }),
        }
    }
}

impl<R: CommitReader + ?Sized> Iterator for CommitWalker<'_, R> {
    type Item = Result<WalkedCommit>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = match std::mem::replace(&mut self.state, State::Done) {
            State::At(id) => id,
            State::Done => return None,
        };
        self.step(id).transpose()
    }
}

impl<R: CommitReader + ?Sized> std::iter::FusedIterator for CommitWalker<'_, R> {}
