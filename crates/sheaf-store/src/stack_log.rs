//! Append-only, hash-chained record of every committed series transaction
//! (`.sheaf/stack_log.jsonl`).

use crate::paths::SheafPaths;
use serde::{Deserialize, Serialize};
use sheaf_core::canon::canonical_json_bytes;
use sheaf_core::hash::sha256_hex;
use sheaf_core::Series;
use std::io::{BufRead, Read, Seek, SeekFrom, Write};

/// Bytes read from the end of the log per attempt when looking for the last
/// entry; doubled until a full line fits.
const TAIL_WINDOW: u64 = 4096;

/// One committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLogEntry {
    pub entry_id: String,
    pub ts: String,
    pub op: String,
    pub generation: u64,
    pub parent_hash: Option<String>,
    pub hash: String,
    pub base: String,
    pub top: String,
    pub applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unapplied: Vec<String>,
}

impl StateLogEntry {
    /// Build an entry describing `series` after transaction `op`, chained to
    /// `parent_hash`.
    pub fn new(op: &str, generation: u64, parent_hash: Option<&str>, series: &Series) -> Self {
        let mut entry = Self {
            entry_id: format!("st_{}", ulid::Ulid::new().to_string().to_lowercase()),
            ts: now_rfc3339(),
            op: op.to_string(),
            generation,
            parent_hash: parent_hash.map(|s| s.to_string()),
            hash: String::new(),
            base: series.base.to_string(),
            top: series.top().to_string(),
            applied: series.applied.iter().map(|n| n.to_string()).collect(),
            unapplied: series.unapplied.iter().map(|n| n.to_string()).collect(),
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// SHA-256 over the canonical JSON of every field except `hash`.
    pub fn compute_hash(&self) -> String {
        let mut val = serde_json::json!({
            "entry_id": self.entry_id,
            "ts": self.ts,
            "op": self.op,
            "generation": self.generation,
            "parent_hash": self.parent_hash,
            "base": self.base,
            "top": self.top,
            "applied": self.applied,
        });
        if !self.unapplied.is_empty() {
            val["unapplied"] = serde_json::json!(self.unapplied);
        }
        sha256_hex(&canonical_json_bytes(&val))
    }
}

/// Append an entry to `stack_log.jsonl`.
pub fn append_entry(paths: &SheafPaths, entry: &StateLogEntry, fsync: bool) -> std::io::Result<()> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.stack_log_jsonl)?;
    file.write_all(line.as_bytes())?;
    if fsync {
        file.sync_all()?;
    }
    Ok(())
}

/// Read every entry, oldest first. Returns empty vec if the file doesn't exist.
pub fn read_entries(paths: &SheafPaths) -> anyhow::Result<Vec<StateLogEntry>> {
    if !paths.stack_log_jsonl.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(&paths.stack_log_jsonl)?;
    let mut entries = Vec::new();
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

/// Hash of the newest entry, or `None` if the log is empty. Only the tail of
/// the file is read.
pub fn last_hash(paths: &SheafPaths) -> anyhow::Result<Option<String>> {
    let mut file = match std::fs::File::open(&paths.stack_log_jsonl) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let len = file.metadata()?.len();
    let mut window = TAIL_WINDOW.min(len);
    loop {
        file.seek(SeekFrom::Start(len - window))?;
        let mut buf = Vec::new();
        (&mut file).take(window).read_to_end(&mut buf)?;
        let end = buf
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        let tail = &buf[..end];

        let line = match tail.iter().rposition(|&b| b == b'\n') {
            Some(nl) => &tail[nl + 1..],
            None if window == len => tail,
            None => {
                window = (window * 2).min(len);
                continue;
            }
        };
        if line.is_empty() {
            return Ok(None);
        }
        let entry: StateLogEntry = serde_json::from_slice(line)?;
        return Ok(Some(entry.hash));
    }
}

/// Check hashes and parent links. Returns the index of the first bad entry.
pub fn verify_chain(entries: &[StateLogEntry]) -> Result<(), usize> {
    let mut prev: Option<&str> = None;
    for (i, entry) in entries.iter().enumerate() {
        if entry.parent_hash.as_deref() != prev || entry.compute_hash() != entry.hash {
            return Err(i);
        }
        prev = Some(&entry.hash);
    }
    Ok(())
}

fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
