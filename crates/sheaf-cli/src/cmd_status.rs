use sheaf_core::{CommitId, SeriesStore};
use sheaf_store::{ObjectStore, Workspace};
use std::path::Path;

/// Where HEAD sits relative to the stack top.
#[derive(Debug, PartialEq, Eq)]
enum HeadPosition {
    AtTop,
    /// HEAD has this many first-parent commits above the top.
    Above(usize),
    Diverged,
}

fn head_position(
    objects: &ObjectStore,
    head: &CommitId,
    top: &CommitId,
) -> anyhow::Result<HeadPosition> {
    let mut cur = head.clone();
    let mut steps = 0;
    loop {
        if &cur == top {
            return Ok(if steps == 0 {
                HeadPosition::AtTop
            } else {
                HeadPosition::Above(steps)
            });
        }
        match objects.read_commit(&cur)?.parents.first() {
            Some(parent) => {
                cur = parent.clone();
                steps += 1;
            }
            None => return Ok(HeadPosition::Diverged),
        }
    }
}

/// `sheaf status`
pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    let series = ws.stack.load_series()?;
    let head = ws.objects.head()?;
    let head_commit = ws.objects.read_commit(&head)?;

    println!("HEAD: {} {}", head.short(), head_commit.summary());
    match series.top_patch() {
        Some(name) => println!("Top:  {} ({name})", series.top().short()),
        None => println!("Top:  {} (base)", series.top().short()),
    }
    println!("Base: {}", series.base.short());
    println!(
        "Patches: {} applied, {} unapplied, {} hidden",
        series.applied.len(),
        series.unapplied.len(),
        series.hidden.len()
    );

    match head_position(&ws.objects, &head, series.top())? {
        HeadPosition::AtTop => {}
        HeadPosition::Above(n) => {
            println!("HEAD is {n} commit(s) above the stack top; `sheaf uncommit` can adopt them")
        }
        HeadPosition::Diverged => println!("HEAD does not descend from the stack top"),
    }
    Ok(())
}
