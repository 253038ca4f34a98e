//! Content-addressed commit objects under `.sheaf/objects/` plus the HEAD ref.
//!
//! This is the history backend the engine reads through [`CommitReader`].
//! Objects are written once and never rewritten.

use crate::atomic::write_atomic;
use crate::paths::SheafPaths;
use sheaf_core::{Commit, CommitId, CommitReader, Result, StackError};

/// Shortest accepted abbreviation of a commit id.
pub const MIN_PREFIX_LEN: usize = 4;

pub struct ObjectStore {
    pub paths: SheafPaths,
    fsync: bool,
}

impl ObjectStore {
    pub fn new(paths: SheafPaths, fsync: bool) -> Self {
        Self { paths, fsync }
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.paths.object_path(id.as_str()).is_file()
    }

    /// Store a commit object. Writing an existing object is a no-op.
    pub fn write_commit(&self, commit: &Commit) -> Result<CommitId> {
        if !commit.verify() {
            return Err(StackError::Corrupt(format!(
                "commit {} does not match its content",
                commit.id
            )));
        }
        for parent in &commit.parents {
            if !self.contains(parent) {
                return Err(StackError::MissingCommit(parent.to_string()));
            }
        }
        let path = self.paths.object_path(commit.id.as_str());
        if !path.exists() {
            let json = serde_json::to_vec_pretty(commit)?;
            write_atomic(&path, &json, self.fsync)?;
            tracing::debug!(commit = %commit.id.short(), "wrote commit object");
        }
        Ok(commit.id.clone())
    }

    /// Build, store and return a new commit. HEAD is not moved.
    pub fn create_commit(
        &self,
        parents: Vec<CommitId>,
        message: &str,
        tree: &str,
    ) -> Result<Commit> {
        let commit = Commit::new(parents, message, tree);
        self.write_commit(&commit)?;
        Ok(commit)
    }

    /// Read and verify a commit object.
    pub fn read_commit(&self, id: &CommitId) -> Result<Commit> {
        let path = self.paths.object_path(id.as_str());
        let content = match std::fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StackError::MissingCommit(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let commit: Commit = serde_json::from_slice(&content)?;
        if &commit.id != id || !commit.verify() {
            return Err(StackError::Corrupt(format!("object {id} failed verification")));
        }
        Ok(commit)
    }

    /// Current HEAD commit.
    pub fn head(&self) -> Result<CommitId> {
        let content = std::fs::read_to_string(&self.paths.head_file)
            .map_err(|e| StackError::Storage(format!("cannot read HEAD: {e}")))?;
        content
            .trim()
            .parse()
            .map_err(|_| StackError::Corrupt(format!("HEAD holds `{}`", content.trim())))
    }

    pub fn has_head(&self) -> bool {
        self.paths.head_file.is_file()
    }

    /// Point HEAD at an existing commit.
    pub fn set_head(&self, id: &CommitId) -> Result<()> {
        if !self.contains(id) {
            return Err(StackError::MissingCommit(id.to_string()));
        }
        write_atomic(&self.paths.head_file, format!("{id}\n").as_bytes(), self.fsync)?;
        Ok(())
    }

    /// Resolve a revision: `HEAD`, `HEAD~N`, a full id or a unique prefix
    /// (at least [`MIN_PREFIX_LEN`] hex characters), optionally with `~N`.
    pub fn resolve(&self, rev: &str) -> Result<CommitId> {
        let (name, back) = match rev.split_once('~') {
            Some((name, n)) if n.is_empty() => (name, 1),
            Some((name, n)) => (
                name,
                n.parse::<usize>()
                    .map_err(|_| StackError::MissingCommit(rev.to_string()))?,
            ),
            None => (rev, 0),
        };

        let mut id = if name == "HEAD" {
            self.head()?
        } else {
            self.resolve_id(name)?
        };
        for _ in 0..back {
            let commit = self.read_commit(&id)?;
            id = commit
                .parents
                .into_iter()
                .next()
                .ok_or_else(|| StackError::MissingCommit(rev.to_string()))?;
        }
        Ok(id)
    }

    fn resolve_id(&self, hex: &str) -> Result<CommitId> {
        if let Ok(id) = hex.parse::<CommitId>() {
            return if self.contains(&id) {
                Ok(id)
            } else {
                Err(StackError::MissingCommit(hex.to_string()))
            };
        }
        let lower = hex.to_ascii_lowercase();
        if lower.len() < MIN_PREFIX_LEN || !lower.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StackError::MissingCommit(hex.to_string()));
        }

        let (fanout, rest) = lower.split_at(2);
        let dir = self.paths.objects_dir.join(fanout);
        let mut matches = Vec::new();
        if dir.is_dir() {
            for entry in std::fs::read_dir(&dir)? {
                let file_name = entry?.file_name();
                let file_name = file_name.to_string_lossy();
                if let Some(stem) = file_name.strip_suffix(".json") {
                    if stem.starts_with(rest) {
                        matches.push(format!("{fanout}{stem}"));
                    }
                }
            }
        }
        match matches.as_slice() {
            [one] => one.parse(),
            [] => Err(StackError::MissingCommit(hex.to_string())),
            _ => Err(StackError::Storage(format!(
                "ambiguous commit prefix `{hex}` ({} matches)",
                matches.len()
            ))),
        }
    }

    /// First-parent history from `from`, newest first. `limit` of 0 means
    /// no limit.
    pub fn history(&self, from: &CommitId, limit: usize) -> Result<Vec<Commit>> {
        let mut out = Vec::new();
        let mut cur = Some(from.clone());
        while let Some(id) = cur {
            if limit > 0 && out.len() >= limit {
                break;
            }
            let commit = self.read_commit(&id)?;
            cur = commit.parents.first().cloned();
            out.push(commit);
        }
        Ok(out)
    }
}

/// Distance below HEAD named by `HEAD`, `HEAD~` or `HEAD~N`; `None` for any
/// other revision.
pub fn head_distance(rev: &str) -> Option<usize> {
    match rev.strip_prefix("HEAD")? {
        "" => Some(0),
        "~" => Some(1),
        rest => rest.strip_prefix('~')?.parse().ok(),
    }
}

impl CommitReader for ObjectStore {
    fn commit_parents(&self, id: &CommitId) -> Result<Vec<CommitId>> {
        Ok(self.read_commit(id)?.parents)
    }

    fn commit_message(&self, id: &CommitId) -> Result<String> {
        Ok(self.read_commit(id)?.message)
    }

    fn ref_head(&self) -> Result<CommitId> {
        self.head()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_distance_parses_head_forms_only() {
        assert_eq!(head_distance("HEAD"), Some(0));
        assert_eq!(head_distance("HEAD~"), Some(1));
        assert_eq!(head_distance("HEAD~3"), Some(3));
        assert_eq!(head_distance("HEAD~x"), None);
        assert_eq!(head_distance("abcd~1"), None);
    }
    use sheaf_core::ErrorKind;

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SheafPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        (tmp, ObjectStore::new(paths, false))
    }

    #[test]
    fn write_read_and_head() {
        let (_tmp, objects) = store();
        let root = objects.create_commit(vec![], "initial", "t0").unwrap();
        let a = objects.create_commit(vec![root.id.clone()], "a", "t1").unwrap();
        objects.set_head(&a.id).unwrap();

        assert_eq!(objects.head().unwrap(), a.id);
        assert_eq!(objects.read_commit(&a.id).unwrap(), a);
        assert_eq!(objects.commit_parents(&a.id).unwrap(), vec![root.id.clone()]);
        assert_eq!(objects.commit_message(&a.id).unwrap(), "a");
        assert_eq!(objects.ref_head().unwrap(), a.id);
    }

    #[test]
    fn parents_must_exist() {
        let (_tmp, objects) = store();
        let stray = Commit::new(vec![], "elsewhere", "t");
        let err = objects
            .create_commit(vec![stray.id.clone()], "child", "t")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCommit);
        assert!(objects.set_head(&stray.id).is_err());
    }

    #[test]
    fn tampered_object_is_detected() {
        let (_tmp, objects) = store();
        let root = objects.create_commit(vec![], "initial", "t0").unwrap();
        let path = objects.paths.object_path(root.id.as_str());
        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace("initial", "rewritten");
        std::fs::write(&path, edited).unwrap();
        let err = objects.read_commit(&root.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn resolve_revisions() {
        let (_tmp, objects) = store();
        let root = objects.create_commit(vec![], "initial", "t0").unwrap();
        let a = objects.create_commit(vec![root.id.clone()], "a", "t1").unwrap();
        let b = objects.create_commit(vec![a.id.clone()], "b", "t2").unwrap();
        objects.set_head(&b.id).unwrap();

        assert_eq!(objects.resolve("HEAD").unwrap(), b.id);
        assert_eq!(objects.resolve("HEAD~").unwrap(), a.id);
        assert_eq!(objects.resolve("HEAD~2").unwrap(), root.id);
        assert_eq!(objects.resolve(a.id.as_str()).unwrap(), a.id);
        assert_eq!(objects.resolve(&a.id.as_str()[..10]).unwrap(), a.id);
        assert_eq!(objects.resolve(&format!("{}~1", b.id)).unwrap(), a.id);
        assert!(objects.resolve("HEAD~3").is_err());
        assert!(objects.resolve("abc").is_err());
        assert!(objects.resolve("zzzzzz").is_err());
    }

    #[test]
    fn history_follows_first_parent() {
        let (_tmp, objects) = store();
        let root = objects.create_commit(vec![], "initial", "t0").unwrap();
        let a = objects.create_commit(vec![root.id.clone()], "a", "t1").unwrap();
        let all = objects.history(&a.id, 0).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(objects.history(&a.id, 1).unwrap().len(), 1);
    }
}
