//! Plain history operations. The stack only observes these; it never owns
//! the commits they create.

use sheaf_core::{tree_of, CommitId};
use sheaf_store::Workspace;
use std::path::Path;

/// `sheaf record -m <msg> [--content <s>] [--merge <rev>]...`
pub fn record(
    repo_root: &Path,
    message: &str,
    content: &str,
    merges: &[String],
) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    let id = record_in(&ws, message, content, merges)?;
    println!("[{}] {}", id.short(), sheaf_core::commit::first_line(message));
    Ok(())
}

pub(crate) fn record_in(
    ws: &Workspace,
    message: &str,
    content: &str,
    merges: &[String],
) -> anyhow::Result<CommitId> {
    if message.trim().is_empty() {
        anyhow::bail!("commit message must not be empty");
    }
    let mut parents = vec![ws.objects.head()?];
    for rev in merges {
        let id = ws.objects.resolve(rev)?;
        if parents.contains(&id) {
            anyhow::bail!("duplicate parent {}", id.short());
        }
        parents.push(id);
    }

    let commit = ws
        .objects
        .create_commit(parents, message, &tree_of(content.as_bytes()))?;
    ws.objects.set_head(&commit.id)?;
    tracing::debug!(commit = %commit.id.short(), parents = commit.parents.len(), "recorded");
    Ok(commit.id)
}

/// `sheaf reset <rev>`
pub fn reset(repo_root: &Path, rev: &str) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    let id = ws.objects.resolve(rev)?;
    ws.objects.set_head(&id)?;
    println!("HEAD is now at {}", id.short());
    Ok(())
}
