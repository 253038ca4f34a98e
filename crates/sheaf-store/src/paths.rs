use std::path::{Path, PathBuf};

/// All well-known paths under `.sheaf/`.
#[derive(Debug, Clone)]
pub struct SheafPaths {
    pub root: PathBuf,
    pub sheaf_dir: PathBuf,
    pub objects_dir: PathBuf,
    pub refs_dir: PathBuf,
    pub head_file: PathBuf,
    pub stack_json: PathBuf,
    pub stack_log_jsonl: PathBuf,
    pub lock_file: PathBuf,
    pub config_json: PathBuf,
}

impl SheafPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let sheaf_dir = root.join(".sheaf");
        let refs_dir = sheaf_dir.join("refs");
        Self {
            objects_dir: sheaf_dir.join("objects"),
            head_file: refs_dir.join("HEAD"),
            stack_json: sheaf_dir.join("stack.json"),
            stack_log_jsonl: sheaf_dir.join("stack_log.jsonl"),
            lock_file: sheaf_dir.join("LOCK"),
            config_json: sheaf_dir.join("config.json"),
            refs_dir,
            sheaf_dir,
            root,
        }
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [&self.sheaf_dir, &self.objects_dir, &self.refs_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Check whether `.sheaf/` exists.
    pub fn is_initialized(&self) -> bool {
        self.sheaf_dir.is_dir()
    }

    /// Object file for a full commit id: `objects/ab/cdef....json`.
    pub fn object_path(&self, id: &str) -> PathBuf {
        let (fanout, rest) = id.split_at(2.min(id.len()));
        self.objects_dir.join(fanout).join(format!("{rest}.json"))
    }

    /// Walk up from `start` looking for a directory containing `.sheaf/`.
    /// Returns `None` if not found.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".sheaf").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_builds_correct_paths() {
        let p = SheafPaths::discover("/tmp/repo");
        assert_eq!(p.sheaf_dir, PathBuf::from("/tmp/repo/.sheaf"));
        assert_eq!(p.head_file, PathBuf::from("/tmp/repo/.sheaf/refs/HEAD"));
        assert_eq!(p.stack_json, PathBuf::from("/tmp/repo/.sheaf/stack.json"));
        assert_eq!(
            p.stack_log_jsonl,
            PathBuf::from("/tmp/repo/.sheaf/stack_log.jsonl")
        );
        assert_eq!(p.lock_file, PathBuf::from("/tmp/repo/.sheaf/LOCK"));
        assert_eq!(
            p.object_path("abcdef"),
            PathBuf::from("/tmp/repo/.sheaf/objects/ab/cdef.json")
        );
    }

    #[test]
    fn ensure_layout_and_find_root() {
        let tmp = tempfile::tempdir().unwrap();
        let p = SheafPaths::discover(tmp.path());
        assert!(!p.is_initialized());
        p.ensure_layout().unwrap();
        assert!(p.objects_dir.is_dir());
        assert!(p.refs_dir.is_dir());

        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(SheafPaths::find_root(&nested), Some(tmp.path().to_path_buf()));
    }
}
