//! The ordered patch series and its applied/unapplied/hidden partitions.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::commit::CommitId;
use crate::error::{Result, StackError};
use crate::patchname::PatchName;

/// Where a patch currently points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchDescriptor {
    pub commit: CommitId,
}

/// Snapshot of a patch stack.
///
/// `applied` is bottom-to-top; the last entry is the top of the stack.
/// Every name listed in one of the three partitions has exactly one entry in
/// `patches`, and no name is listed twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// Commit below the bottommost patch.
    pub base: CommitId,
    #[serde(default)]
    pub applied: Vec<PatchName>,
    #[serde(default)]
    pub unapplied: Vec<PatchName>,
    #[serde(default)]
    pub hidden: Vec<PatchName>,
    #[serde(default)]
    pub patches: BTreeMap<PatchName, PatchDescriptor>,
}

impl Series {
    pub fn new(base: CommitId) -> Self {
        Self {
            base,
            applied: Vec::new(),
            unapplied: Vec::new(),
            hidden: Vec::new(),
            patches: BTreeMap::new(),
        }
    }

    /// Commit of the last applied patch, or the base when nothing is applied.
    pub fn top(&self) -> &CommitId {
        self.applied
            .last()
            .and_then(|name| self.patches.get(name))
            .map(|desc| &desc.commit)
            .unwrap_or(&self.base)
    }

    pub fn top_patch(&self) -> Option<&PatchName> {
        self.applied.last()
    }

    pub fn has_patch(&self, name: &PatchName) -> bool {
        self.patches.contains_key(name)
    }

    pub fn patch_commit(&self, name: &PatchName) -> Option<&CommitId> {
        self.patches.get(name).map(|desc| &desc.commit)
    }

    /// All names in stack order: applied, then unapplied, then hidden.
    pub fn all_patches(&self) -> impl Iterator<Item = &PatchName> {
        self.applied
            .iter()
            .chain(self.unapplied.iter())
            .chain(self.hidden.iter())
    }

    pub fn names(&self) -> BTreeSet<PatchName> {
        self.patches.keys().cloned().collect()
    }

    /// Commits referenced by any patch, applied or not.
    pub fn tracked_commits(&self) -> HashSet<CommitId> {
        self.patches.values().map(|d| d.commit.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Append a new applied patch directly above the current top.
    pub fn push_applied(&mut self, name: PatchName, commit: CommitId) -> Result<()> {
        if self.has_patch(&name) {
            return Err(StackError::NameCollision(name.to_string()));
        }
        self.patches.insert(name.clone(), PatchDescriptor { commit });
        self.applied.push(name);
        Ok(())
    }

    /// Remove the `count` bottommost applied patches, returning them
    /// bottom-first along with their commits.
    pub fn pop_bottom(&mut self, count: usize) -> Result<Vec<(PatchName, CommitId)>> {
        if count > self.applied.len() {
            return Err(StackError::Corrupt(format!(
                "cannot remove {count} patches, only {} applied",
                self.applied.len()
            )));
        }
        let mut removed = Vec::with_capacity(count);
        for name in self.applied.drain(..count) {
            let desc = self
                .patches
                .remove(&name)
                .ok_or_else(|| StackError::Corrupt(format!("no descriptor for `{name}`")))?;
            removed.push((name, desc.commit));
        }
        Ok(removed)
    }

    /// Check the structural invariants of a snapshot loaded from storage.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for name in self.all_patches() {
            if !seen.insert(name) {
                return Err(StackError::Corrupt(format!("patch `{name}` listed twice")));
            }
            if !self.patches.contains_key(name) {
                return Err(StackError::Corrupt(format!("patch `{name}` has no descriptor")));
            }
        }
        if let Some(orphan) = self.patches.keys().find(|name| !seen.contains(name)) {
            return Err(StackError::Corrupt(format!(
                "patch `{orphan}` is in no partition"
            )));
        }
        Ok(())
    }
}
