use sheaf_core::{PatchName, Series, SeriesStore};
use sheaf_store::Workspace;
use std::path::Path;

/// `sheaf series [--commits] [--json]`
pub fn execute(repo_root: &Path, commits: bool, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    let series = ws.stack.load_series()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }
    if series.is_empty() {
        println!("(no patches)");
        return Ok(());
    }
    for line in render(&ws, &series, commits)? {
        println!("{line}");
    }
    Ok(())
}

/// One line per patch: `>` top, `+` applied, `-` unapplied, `!` hidden.
fn render(ws: &Workspace, series: &Series, commits: bool) -> anyhow::Result<Vec<String>> {
    let top = series.top_patch();
    let marked = series
        .applied
        .iter()
        .map(|n| (if Some(n) == top { '>' } else { '+' }, n))
        .chain(series.unapplied.iter().map(|n| ('-', n)))
        .chain(series.hidden.iter().map(|n| ('!', n)));

    let mut lines = Vec::new();
    for (mark, name) in marked {
        lines.push(line(ws, series, mark, name, commits)?);
    }
    Ok(lines)
}

fn line(
    ws: &Workspace,
    series: &Series,
    mark: char,
    name: &PatchName,
    commits: bool,
) -> anyhow::Result<String> {
    if !commits {
        return Ok(format!("{mark} {name}"));
    }
    let Some(id) = series.patch_commit(name) else {
        return Ok(format!("{mark} {name}"));
    };
    let commit = ws.objects.read_commit(id)?;
    Ok(format!("{mark} {name:<24} {} {}", id.short(), commit.summary()))
}
