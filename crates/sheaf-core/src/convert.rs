//! Pure transformations between plain history and patches. Nothing here
//! touches storage; callers run these inside a series transaction.

use std::collections::BTreeSet;

use crate::commit::CommitId;
use crate::error::{Result, StackError};
use crate::patchname::PatchName;
use crate::select::Candidate;
use crate::series::Series;

/// Validate supplied names and derive missing ones for a whole batch.
///
/// Names are checked against the series and against each other; the first
/// collision fails the batch. Derived names skip every name already taken.
pub fn assign_names(
    series: &Series,
    candidates: &[Candidate],
    name_length: Option<usize>,
) -> Result<Vec<PatchName>> {
    let mut taken: BTreeSet<PatchName> = series.names();
    for name in candidates.iter().filter_map(|c| c.name.as_ref()) {
        if !taken.insert(name.clone()) {
            return Err(StackError::NameCollision(name.to_string()));
        }
    }

    let mut assigned = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let name = match &candidate.name {
            Some(name) => name.clone(),
            None => {
                let derived = PatchName::make_unique(&candidate.message, name_length, &taken);
                taken.insert(derived.clone());
                derived
            }
        };
        assigned.push(name);
    }
    Ok(assigned)
}

/// Append one applied patch per candidate above the current top, oldest
/// first. When nothing was applied, the base moves to the parent of the
/// oldest candidate.
pub fn apply_uncommit(
    mut series: Series,
    candidates: &[Candidate],
    names: &[PatchName],
) -> Result<Series> {
    if candidates.len() != names.len() {
        return Err(StackError::Corrupt(format!(
            "{} commits but {} names",
            candidates.len(),
            names.len()
        )));
    }
    if series.applied.is_empty() {
        if let Some(oldest) = candidates.first() {
            series.base = oldest.parent.clone();
        }
    }
    for (candidate, name) in candidates.iter().zip(names) {
        series.push_applied(name.clone(), candidate.commit.clone())?;
    }
    Ok(series)
}

/// Which applied patches to fold back into plain history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitRequest {
    /// The `n` bottommost applied patches.
    Count(i64),
    /// Every applied patch.
    All,
    /// Exactly these patches; together they must be a bottom run of the
    /// applied list.
    Names(Vec<String>),
}

impl Default for CommitRequest {
    fn default() -> Self {
        CommitRequest::Count(1)
    }
}

/// Remove the selected bottom patches and move the base up to the newest of
/// them. Returns the folded names bottom-first.
pub fn apply_commit(
    mut series: Series,
    request: &CommitRequest,
) -> Result<(Series, Vec<PatchName>)> {
    let count = committable_count(&series, request)?;
    let removed = series.pop_bottom(count)?;
    let mut folded = Vec::with_capacity(removed.len());
    let mut new_base: Option<CommitId> = None;
    for (name, commit) in removed {
        folded.push(name);
        new_base = Some(commit);
    }
    if let Some(base) = new_base {
        series.base = base;
    }
    Ok((series, folded))
}

fn committable_count(series: &Series, request: &CommitRequest) -> Result<usize> {
    let applied = series.applied.len();
    match request {
        CommitRequest::Count(n) if *n <= 0 => Err(StackError::NonPositiveCount(*n)),
        _ if applied == 0 => Err(StackError::NothingToCommit),
        CommitRequest::Count(n) => {
            let n = usize::try_from(*n).map_err(|_| StackError::NonPositiveCount(*n))?;
            if n > applied {
                return Err(StackError::InsufficientHistory {
                    requested: n,
                    found: applied,
                });
            }
            Ok(n)
        }
        CommitRequest::All => Ok(applied),
        CommitRequest::Names(raw) => {
            if raw.is_empty() {
                return Err(StackError::UsageConflict("no patch names given"));
            }
            let mut wanted = BTreeSet::new();
            for s in raw {
                let name: PatchName = s.parse()?;
                if !series.has_patch(&name) {
                    return Err(StackError::UnknownPatch(name.to_string()));
                }
                if !wanted.insert(name) {
                    return Err(StackError::UsageConflict("patch named more than once"));
                }
            }
            let k = wanted.len();
            let bottom = &series.applied[..k.min(applied)];
            if let Some(stray) = wanted.iter().find(|n| !bottom.contains(*n)) {
                return Err(StackError::NotCommittable(stray.to_string()));
            }
            Ok(k)
        }
    }
}
