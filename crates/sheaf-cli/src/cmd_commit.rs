use sheaf_core::{commit, CommitRequest, PatchName};
use sheaf_store::Workspace;
use std::path::Path;

/// `sheaf commit [NAMES..] [-n N] [-a]`
pub fn execute(
    repo_root: &Path,
    names: Vec<String>,
    number: Option<i64>,
    all: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    let folded = commit_in(&ws, names, number, all)?;
    for name in &folded {
        println!("- {name}");
    }
    println!("Committed {} patch(es)", folded.len());
    Ok(())
}

pub(crate) fn commit_in(
    ws: &Workspace,
    names: Vec<String>,
    number: Option<i64>,
    all: bool,
) -> anyhow::Result<Vec<PatchName>> {
    let request = match (all, number, names.is_empty()) {
        (true, None, true) => CommitRequest::All,
        (false, Some(n), true) => CommitRequest::Count(n),
        (false, None, false) => CommitRequest::Names(names),
        (false, None, true) => CommitRequest::default(),
        _ => anyhow::bail!("--all, --number and patch names are mutually exclusive"),
    };
    Ok(commit(&ws.stack, &request)?)
}
