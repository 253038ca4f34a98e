//! The authoritative series snapshot in `.sheaf/stack.json`.

use crate::atomic::write_atomic;
use crate::config::Config;
use crate::lock::WorkspaceLock;
use crate::paths::SheafPaths;
use crate::stack_log::{self, StateLogEntry};
use serde::{Deserialize, Serialize};
use sheaf_core::{CommitId, Result, Series, SeriesStore, StackError};

/// On-disk format version of `stack.json`.
pub const STACK_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StackFile {
    version: u32,
    /// Bumped by every committed transaction.
    generation: u64,
    #[serde(flatten)]
    series: Series,
}

pub struct StackStore {
    pub paths: SheafPaths,
    config: Config,
}

impl StackStore {
    pub fn new(paths: SheafPaths, config: Config) -> Self {
        Self { paths, config }
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.stack_json.is_file()
    }

    /// Create an empty series on `base`. Fails if a series already exists.
    pub fn init(&self, base: &CommitId) -> Result<()> {
        let _lock = self.lock()?;
        if self.is_initialized() {
            return Err(StackError::Storage(format!(
                "stack already initialized at {}",
                self.paths.stack_json.display()
            )));
        }
        self.persist("init", 0, &Series::new(base.clone()))
    }

    /// Current generation and series.
    pub fn load(&self) -> Result<(u64, Series)> {
        let content = match std::fs::read(&self.paths.stack_json) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StackError::Storage(
                    "no stack here. Run `sheaf init` first.".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };
        let file: StackFile = serde_json::from_slice(&content)?;
        if file.version != STACK_FORMAT_VERSION {
            return Err(StackError::Corrupt(format!(
                "unsupported stack format version {} (expected {STACK_FORMAT_VERSION})",
                file.version
            )));
        }
        file.series.check_invariants()?;
        Ok((file.generation, file.series))
    }

    fn lock(&self) -> Result<WorkspaceLock> {
        WorkspaceLock::acquire_with_retry(
            &self.paths,
            self.config.lock_retries,
            self.config.lock_retry_delay(),
        )
    }

    /// Write `series` as `generation + 1` and log it. Caller holds the lock.
    fn persist(&self, op: &str, generation: u64, series: &Series) -> Result<()> {
        let next = generation + 1;
        let file = StackFile {
            version: STACK_FORMAT_VERSION,
            generation: next,
            series: series.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.paths.stack_json, &json, self.config.fsync)?;

        // The snapshot above is authoritative; a log failure must not undo it.
        let logged = stack_log::last_hash(&self.paths)
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|parent| {
                let entry = StateLogEntry::new(op, next, parent.as_deref(), series);
                stack_log::append_entry(&self.paths, &entry, self.config.fsync)
            });
        if let Err(e) = logged {
            tracing::warn!(op, generation = next, "stack log append failed: {e}");
        }
        tracing::info!(op, generation = next, top = %series.top().short(), "stack updated");
        Ok(())
    }
}

impl SeriesStore for StackStore {
    fn load_series(&self) -> Result<Series> {
        Ok(self.load()?.1)
    }

    fn with_series_transaction<F>(&self, op: &str, f: F) -> Result<()>
    where
        F: FnOnce(Series) -> Result<Series>,
    {
        let _lock = self.lock()?;
        let (generation, current) = self.load()?;
        tracing::debug!(op, generation, "transaction started");

        let next = f(current.clone())?;
        next.check_invariants()?;
        if next == current {
            tracing::debug!(op, "transaction made no changes");
            return Ok(());
        }
        self.persist(op, generation, &next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ObjectStore;
    use sheaf_core::{ErrorKind, PatchName};

    fn setup() -> (tempfile::TempDir, ObjectStore, StackStore) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SheafPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        let config = Config {
            lock_retries: 2,
            lock_retry_delay_ms: 1,
            fsync: false,
            ..Config::default()
        };
        let objects = ObjectStore::new(paths.clone(), false);
        let root = objects.create_commit(vec![], "initial", "t0").unwrap();
        objects.set_head(&root.id).unwrap();
        let stack = StackStore::new(paths, config);
        stack.init(&root.id).unwrap();
        (tmp, objects, stack)
    }

    fn name(s: &str) -> PatchName {
        s.parse().unwrap()
    }

    #[test]
    fn init_twice_fails() {
        let (_tmp, objects, stack) = setup();
        assert!(stack.init(&objects.head().unwrap()).is_err());
        let (generation, series) = stack.load().unwrap();
        assert_eq!(generation, 1);
        assert!(series.is_empty());
    }

    #[test]
    fn committed_transaction_bumps_generation_and_logs() {
        let (_tmp, objects, stack) = setup();
        let head = objects.head().unwrap();
        stack
            .with_series_transaction("test", |mut s| {
                s.push_applied(name("p"), head.clone())?;
                Ok(s)
            })
            .unwrap();

        let (generation, series) = stack.load().unwrap();
        assert_eq!(generation, 2);
        assert_eq!(series.applied, vec![name("p")]);

        let entries = stack_log::read_entries(&stack.paths).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].op, "init");
        assert_eq!(entries[1].op, "test");
        assert_eq!(entries[1].generation, 2);
        assert!(stack_log::verify_chain(&entries).is_ok());
    }

    #[test]
    fn failed_closure_leaves_files_untouched() {
        let (_tmp, _objects, stack) = setup();
        let before = std::fs::read(&stack.paths.stack_json).unwrap();
        let err = stack
            .with_series_transaction("test", |_| Err(StackError::NothingToCommit))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NothingToCommit);
        assert_eq!(std::fs::read(&stack.paths.stack_json).unwrap(), before);
        assert_eq!(stack_log::read_entries(&stack.paths).unwrap().len(), 1);
    }

    #[test]
    fn invariant_violation_is_not_persisted() {
        let (_tmp, objects, stack) = setup();
        let head = objects.head().unwrap();
        let res = stack.with_series_transaction("test", |mut s| {
            s.patches.insert(
                name("orphan"),
                sheaf_core::PatchDescriptor { commit: head.clone() },
            );
            Ok(s)
        });
        assert!(res.is_err());
        assert!(stack.load().unwrap().1.is_empty());
    }

    #[test]
    fn unchanged_result_is_not_written() {
        let (_tmp, _objects, stack) = setup();
        stack.with_series_transaction("noop", Ok).unwrap();
        assert_eq!(stack.load().unwrap().0, 1);
        assert_eq!(stack_log::read_entries(&stack.paths).unwrap().len(), 1);
    }

    #[test]
    fn held_lock_gives_contention() {
        let (_tmp, _objects, stack) = setup();
        let _held = WorkspaceLock::acquire(&stack.paths).unwrap();
        let mut ran = false;
        let err = stack
            .with_series_transaction("test", |s| {
                ran = true;
                Ok(s)
            })
            .unwrap_err();
        assert!(err.is_transient());
        assert!(!ran);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let (_tmp, _objects, stack) = setup();
        let content = std::fs::read_to_string(&stack.paths.stack_json).unwrap();
        std::fs::write(
            &stack.paths.stack_json,
            content.replace("\"version\": 1", "\"version\": 9"),
        )
        .unwrap();
        assert!(stack.load().is_err());
    }
}
