use sheaf_core::{CommitId, PatchName, SeriesStore};
use sheaf_store::Workspace;
use std::collections::HashMap;
use std::path::Path;

/// `sheaf log [-n N]`
pub fn execute(repo_root: &Path, limit: usize) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    for line in lines(&ws, limit)? {
        println!("{line}");
    }
    Ok(())
}

fn lines(ws: &Workspace, limit: usize) -> anyhow::Result<Vec<String>> {
    let series = ws.stack.load_series()?;
    let by_commit: HashMap<&CommitId, &PatchName> = series
        .patches
        .iter()
        .map(|(name, desc)| (&desc.commit, name))
        .collect();
    let head = ws.objects.head()?;

    let mut out = Vec::new();
    for commit in ws.objects.history(&head, limit)? {
        let mut tags = Vec::new();
        if commit.id == head {
            tags.push("HEAD".to_string());
        }
        if let Some(name) = by_commit.get(&commit.id) {
            tags.push(format!("patch: {name}"));
        }
        if commit.id == series.base {
            tags.push("base".to_string());
        }
        if commit.parents.len() > 1 {
            tags.push("merge".to_string());
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" ({})", tags.join(", "))
        };
        out.push(format!("{}{tags} {}", commit.id.short(), commit.summary()));
    }
    Ok(out)
}
