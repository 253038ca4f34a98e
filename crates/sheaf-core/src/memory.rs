//! In-memory collaborators: a commit graph with a movable head and a series
//! store with the same all-or-nothing transaction contract as the on-disk one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::backend::{CommitReader, SeriesStore};
use crate::commit::{Commit, CommitId};
use crate::error::{Result, StackError};
use crate::series::Series;

/// Commit graph held in memory. Starts with a single root commit as head.
#[derive(Debug, Clone)]
pub struct MemoryRepo {
    commits: HashMap<CommitId, Commit>,
    head: CommitId,
    clock: u64,
}

impl MemoryRepo {
    pub fn new() -> Self {
        let root = Commit::with_timestamp(vec![], "initial", "", "0");
        let head = root.id.clone();
        let mut commits = HashMap::new();
        commits.insert(root.id.clone(), root);
        Self {
            commits,
            head,
            clock: 0,
        }
    }

    pub fn head(&self) -> CommitId {
        self.head.clone()
    }

    pub fn set_head(&mut self, id: CommitId) {
        self.head = id;
    }

    /// Commit on top of head and advance head.
    pub fn commit(&mut self, message: &str) -> CommitId {
        let parent = self.head.clone();
        let id = self.commit_on(&[parent], message);
        self.head = id.clone();
        id
    }

    /// Write a commit with explicit parents; head is not moved.
    pub fn commit_on(&mut self, parents: &[CommitId], message: &str) -> CommitId {
        self.clock += 1;
        let commit = Commit::with_timestamp(
            parents.to_vec(),
            message,
            "",
            &self.clock.to_string(),
        );
        let id = commit.id.clone();
        self.commits.insert(id.clone(), commit);
        id
    }

    pub fn get(&self, id: &CommitId) -> Option<&Commit> {
        self.commits.get(id)
    }

    fn lookup(&self, id: &CommitId) -> Result<&Commit> {
        self.commits
            .get(id)
            .ok_or_else(|| StackError::MissingCommit(id.to_string()))
    }
}

impl Default for MemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitReader for MemoryRepo {
    fn commit_parents(&self, id: &CommitId) -> Result<Vec<CommitId>> {
        Ok(self.lookup(id)?.parents.clone())
    }

    fn commit_message(&self, id: &CommitId) -> Result<String> {
        Ok(self.lookup(id)?.message.clone())
    }

    fn ref_head(&self) -> Result<CommitId> {
        Ok(self.head.clone())
    }
}

/// Series store held in memory.
#[derive(Debug)]
pub struct MemoryStore {
    series: RefCell<Series>,
    fail_next_persist: Cell<bool>,
    commits: Cell<u64>,
}

impl MemoryStore {
    pub fn new(series: Series) -> Self {
        Self {
            series: RefCell::new(series),
            fail_next_persist: Cell::new(false),
            commits: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> Series {
        self.series.borrow().clone()
    }

    /// Make the next persist step fail after the transformation succeeded.
    pub fn fail_next_persist(&self) {
        self.fail_next_persist.set(true);
    }

    /// Number of transactions that were persisted.
    pub fn committed_transactions(&self) -> u64 {
        self.commits.get()
    }
}

impl SeriesStore for MemoryStore {
    fn load_series(&self) -> Result<Series> {
        Ok(self.snapshot())
    }

    fn with_series_transaction<F>(&self, op: &str, f: F) -> Result<()>
    where
        F: FnOnce(Series) -> Result<Series>,
    {
        let next = f(self.snapshot())?;
        next.check_invariants()?;
        if self.fail_next_persist.replace(false) {
            return Err(StackError::Storage(format!("{op}: injected persist failure")));
        }
        *self.series.borrow_mut() = next;
        self.commits.set(self.commits.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_commits_advance_head() {
        let mut repo = MemoryRepo::new();
        let root = repo.head();
        let a = repo.commit("a");
        assert_eq!(repo.head(), a);
        assert_eq!(repo.commit_parents(&a).unwrap(), vec![root]);
        assert_eq!(repo.commit_message(&a).unwrap(), "a");
    }

    #[test]
    fn identical_messages_get_distinct_ids() {
        let mut repo = MemoryRepo::new();
        let base = repo.head();
        let x = repo.commit_on(&[base.clone()], "same");
        let y = repo.commit_on(&[base], "same");
        assert_ne!(x, y);
    }

    #[test]
    fn failed_transaction_leaves_series_untouched() {
        let repo = MemoryRepo::new();
        let store = MemoryStore::new(Series::new(repo.head()));
        let before = store.snapshot();

        let res = store.with_series_transaction("test", |_| Err(StackError::NothingToCommit));
        assert!(res.is_err());
        assert_eq!(store.snapshot(), before);

        store.fail_next_persist();
        let res = store.with_series_transaction("test", |mut s| {
            s.push_applied("x".parse()?, repo.head())?;
            Ok(s)
        });
        assert!(res.is_err());
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.committed_transactions(), 0);
    }
}
