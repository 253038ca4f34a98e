//! Turns an uncommit request into the concrete run of commits to promote.

use std::collections::HashSet;

use crate::backend::CommitReader;
use crate::commit::CommitId;
use crate::error::{Result, StackError};
use crate::patchname::PatchName;
use crate::series::Series;
use crate::walk::{CommitWalker, WalkedCommit};

/// Where a target-mode uncommit stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    /// A fixed commit.
    Commit(CommitId),
    /// The `n`th first-parent ancestor of HEAD, counted from the HEAD read
    /// inside the transaction.
    HeadAncestor(usize),
}

impl From<CommitId> for TargetRef {
    fn from(id: CommitId) -> Self {
        TargetRef::Commit(id)
    }
}

/// Raw uncommit options as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncommitRequest {
    pub count: Option<i64>,
    pub to: Option<TargetRef>,
    pub names: Vec<String>,
    pub exclusive: bool,
}

/// A validated selection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The `count` most recent commits. `names`, when present, is aligned
    /// oldest to newest.
    Count {
        count: usize,
        names: Option<Vec<PatchName>>,
    },
    /// Every commit strictly newer than `commit` up to HEAD. With
    /// `exclusive`, the oldest of those (the child of `commit`) is left out
    /// as well.
    Target { commit: CommitId, exclusive: bool },
    /// Like `Target`, with the commit `back` first-parent steps below HEAD.
    HeadRelative { back: usize, exclusive: bool },
    /// One commit per name, the first name going to the oldest commit.
    Names(Vec<PatchName>),
}

impl UncommitRequest {
    /// Check option combinations and name syntax. No history is read here.
    pub fn selection(&self) -> Result<Selection> {
        if self.count.is_some() && self.to.is_some() {
            return Err(StackError::UsageConflict("--number cannot be combined with --to"));
        }
        if self.to.is_some() && !self.names.is_empty() {
            return Err(StackError::UsageConflict("patch names cannot be combined with --to"));
        }
        if self.exclusive && self.to.is_none() {
            return Err(StackError::UsageConflict("--exclusive requires --to"));
        }
        if self.count.is_some() && self.names.len() > 1 {
            return Err(StackError::UsageConflict(
                "at most one patch name is allowed with --number",
            ));
        }
        if let Some(n) = self.count {
            if n <= 0 {
                return Err(StackError::NonPositiveCount(n));
            }
        }

        let names = self
            .names
            .iter()
            .map(|s| s.parse::<PatchName>())
            .collect::<Result<Vec<_>>>()?;

        match &self.to {
            Some(TargetRef::Commit(commit)) => {
                return Ok(Selection::Target {
                    commit: commit.clone(),
                    exclusive: self.exclusive,
                })
            }
            Some(TargetRef::HeadAncestor(back)) => {
                return Ok(Selection::HeadRelative {
                    back: *back,
                    exclusive: self.exclusive,
                })
            }
            None => {}
        }

        match self.count {
            Some(n) => {
                let count = usize::try_from(n).map_err(|_| StackError::NonPositiveCount(n))?;
                let names = match names.into_iter().next() {
                    None => None,
                    Some(name) if count == 1 => Some(vec![name]),
                    Some(prefix) => Some(prefix.numbered(count)),
                };
                Ok(Selection::Count { count, names })
            }
            None if names.is_empty() => Ok(Selection::Count {
                count: 1,
                names: None,
            }),
            None => Ok(Selection::Names(names)),
        }
    }
}

/// One commit chosen for promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub commit: CommitId,
    pub parent: CommitId,
    pub message: String,
    pub name: Option<PatchName>,
}

/// Commits the walk from `head` must not pass.
///
/// Commits already owned by a patch are always a boundary. When HEAD sits on
/// the top of a stack with nothing applied, the walk may continue below the
/// base; otherwise both the top and the base are boundaries and only plain
/// commits made above the top are eligible.
pub fn stop_set(series: &Series, head: &CommitId) -> HashSet<CommitId> {
    let mut stop = series.tracked_commits();
    let top = series.top();
    if !(series.applied.is_empty() && head == top) {
        stop.insert(top.clone());
        stop.insert(series.base.clone());
    }
    stop
}

/// Materialize `selection` into candidates ordered oldest first.
pub fn resolve<R: CommitReader + ?Sized>(
    reader: &R,
    series: &Series,
    head: &CommitId,
    selection: &Selection,
) -> Result<Vec<Candidate>> {
    let stop = stop_set(series, head);
    match selection {
        Selection::Count { count, names } => {
            let walked = take_exact(reader, head, stop, *count)?;
            Ok(attach_names(walked, names.as_deref()))
        }
        Selection::Names(names) => {
            let walked = take_exact(reader, head, stop, names.len())?;
            Ok(attach_names(walked, Some(names.as_slice())))
        }
        Selection::Target { commit, exclusive } => {
            take_until(reader, head, stop, commit, *exclusive)
        }
        Selection::HeadRelative { back, exclusive } => {
            let commit = nth_first_parent(reader, head, *back)?;
            take_until(reader, head, stop, &commit, *exclusive)
        }
    }
}

fn take_until<R: CommitReader + ?Sized>(
    reader: &R,
    head: &CommitId,
    mut stop: HashSet<CommitId>,
    target: &CommitId,
    exclusive: bool,
) -> Result<Vec<Candidate>> {
    if target == head {
        return Ok(Vec::new());
    }
    stop.insert(target.clone());
    let walked = CommitWalker::new(reader, head.clone(), stop)
        .collect::<Result<Vec<WalkedCommit>>>()?;
    match walked.last() {
        Some(oldest) if &oldest.parent == target => {}
        _ => return Err(StackError::UnreachableTarget(target.clone())),
    }
    let mut candidates = attach_names(walked, None);
    if exclusive && !candidates.is_empty() {
        candidates.remove(0);
    }
    Ok(candidates)
}

fn nth_first_parent<R: CommitReader + ?Sized>(
    reader: &R,
    head: &CommitId,
    back: usize,
) -> Result<CommitId> {
    let mut id = head.clone();
    for found in 0..back {
        id = reader
            .commit_parents(&id)?
            .into_iter()
            .next()
            .ok_or(StackError::InsufficientHistory {
                requested: back,
                found,
            })?;
    }
    Ok(id)
}

fn take_exact<R: CommitReader + ?Sized>(
    reader: &R,
    head: &CommitId,
    stop: HashSet<CommitId>,
    count: usize,
) -> Result<Vec<WalkedCommit>> {
    let walked = CommitWalker::new(reader, head.clone(), stop)
        .take(count)
        .collect::<Result<Vec<_>>>()?;
    if walked.len() < count {
        return Err(StackError::InsufficientHistory {
            requested: count,
            found: walked.len(),
        });
    }
    Ok(walked)
}

/// Reverse a newest-first walk and pair it with names given oldest first.
fn attach_names(walked: Vec<WalkedCommit>, names: Option<&[PatchName]>) -> Vec<Candidate> {
    walked
        .into_iter()
        .rev()
        .enumerate()
        .map(|(i, w)| Candidate {
            commit: w.id,
            parent: w.parent,
            message: w.message,
            name: names.and_then(|n| n.get(i).cloned()),
        })
        .collect()
}
