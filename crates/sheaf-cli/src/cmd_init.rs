use sheaf_store::{SheafPaths, Workspace};
use std::path::Path;

/// `sheaf init`
pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let already = SheafPaths::discover(repo_root).is_initialized();
    let ws = Workspace::init(repo_root)?;
    let head = ws.objects.head()?;

    if already {
        println!("Already initialized at {}", ws.paths.sheaf_dir.display());
    } else {
        println!(
            "Initialized {} (HEAD={})",
            ws.paths.sheaf_dir.display(),
            head.short()
        );
    }
    Ok(())
}
