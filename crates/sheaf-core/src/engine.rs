//! Entry points: `uncommit` promotes plain commits to patches, `commit` folds
//! patches back into plain history. Both run as one series transaction.

use crate::backend::{CommitReader, SeriesStore};
use crate::convert::{apply_commit, apply_uncommit, assign_names, CommitRequest};
use crate::error::Result;
use crate::patchname::{PatchName, DEFAULT_NAME_LENGTH};
use crate::select::{resolve, UncommitRequest};

/// Tunables read from workspace configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum length of a derived patch name; `None` means unlimited.
    pub name_length: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            name_length: Some(DEFAULT_NAME_LENGTH),
        }
    }
}

/// Promote commits reachable from HEAD into new applied patches.
///
/// Option and name-syntax errors are reported before history is read. HEAD
/// is read inside the transaction and never moved. On any error the stored
/// series is unchanged. Returns the new names bottom-first.
pub fn uncommit<R, S>(
    reader: &R,
    store: &S,
    request: &UncommitRequest,
    options: &EngineOptions,
) -> Result<Vec<PatchName>>
where
    R: CommitReader + ?Sized,
    S: SeriesStore,
{
    let selection = request.selection()?;
    let mut created = Vec::new();
    store.with_series_transaction("uncommit", |series| {
        let head = reader.ref_head()?;
        tracing::debug!(head = %head.short(), top = %series.top().short(), "resolving uncommit");
        let candidates = resolve(reader, &series, &head, &selection)?;
        if candidates.is_empty() {
            return Ok(series);
        }
        let names = assign_names(&series, &candidates, options.name_length)?;
        let next = apply_uncommit(series, &candidates, &names)?;
        created = names;
        Ok(next)
    })?;
    if !created.is_empty() {
        tracing::info!(count = created.len(), "uncommitted patches");
    }
    Ok(created)
}

/// Fold the selected bottom patches into plain history. HEAD is not moved.
/// Returns the folded names bottom-first.
pub fn commit<S: SeriesStore>(store: &S, request: &CommitRequest) -> Result<Vec<PatchName>> {
    let mut folded = Vec::new();
    store.with_series_transaction("commit", |series| {
        let (next, names) = apply_commit(series, request)?;
        folded = names;
        Ok(next)
    })?;
    tracing::info!(count = folded.len(), "committed patches");
    Ok(folded)
}
