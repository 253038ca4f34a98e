use crate::config::Config;
use crate::objects::ObjectStore;
use crate::paths::SheafPaths;
use crate::stack_store::StackStore;
use sheaf_core::tree_of;
use std::path::{Path, PathBuf};

/// An opened `.sheaf/` workspace: history backend, series store and config.
pub struct Workspace {
    pub paths: SheafPaths,
    pub config: Config,
    pub objects: ObjectStore,
    pub stack: StackStore,
}

impl Workspace {
    fn assemble(paths: SheafPaths) -> anyhow::Result<Self> {
        let config = Config::load(&paths)?;
        Ok(Self {
            objects: ObjectStore::new(paths.clone(), config.fsync),
            stack: StackStore::new(paths.clone(), config.clone()),
            config,
            paths,
        })
    }

    /// Open an existing workspace rooted exactly at `repo_root`.
    pub fn open(repo_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let paths = SheafPaths::discover(repo_root);
        if !paths.is_initialized() {
            anyhow::bail!(
                "not a sheaf workspace ({}/.sheaf not found). Run `sheaf init` first.",
                paths.root.display()
            );
        }
        Self::assemble(paths)
    }

    /// Open the nearest workspace at or above `start`.
    pub fn discover(start: &Path) -> anyhow::Result<Self> {
        match SheafPaths::find_root(start) {
            Some(root) => Self::open(root),
            None => anyhow::bail!(
                "not a sheaf workspace (no .sheaf/ in {} or any parent). Run `sheaf init` first.",
                start.display()
            ),
        }
    }

    /// Create the layout, a root commit as HEAD when there is none, and an
    /// empty series based on HEAD. Idempotent.
    pub fn init(repo_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let paths = SheafPaths::discover(repo_root);
        paths.ensure_layout()?;
        let ws = Self::assemble(paths)?;

        if !ws.objects.has_head() {
            let root = ws.objects.create_commit(vec![], "initial", &tree_of(b""))?;
            ws.objects.set_head(&root.id)?;
            tracing::info!(commit = %root.id.short(), "created root commit");
        }
        if !ws.stack.is_initialized() {
            ws.stack.init(&ws.objects.head()?)?;
        }
        Ok(ws)
    }
}
