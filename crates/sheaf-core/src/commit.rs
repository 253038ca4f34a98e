use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::canon::canonical_json_bytes;
use crate::error::StackError;
use crate::hash::{is_full_hex_id, sha256_hex};

/// Content hash identifying one immutable commit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommitId {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_full_hex_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(StackError::MissingCommit(s.to_string()))
        }
    }
}

impl TryFrom<String> for CommitId {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

/// One node of the shared history graph. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub parents: Vec<CommitId>,
    pub message: String,
    pub tree: String,
    pub timestamp: String,
}

impl Commit {
    /// Build a commit stamped with the current time.
    pub fn new(parents: Vec<CommitId>, message: &str, tree: &str) -> Self {
        Self::with_timestamp(parents, message, tree, &now_rfc3339())
    }

    /// Build a commit with an explicit timestamp. The id is the SHA-256 of the
    /// canonical JSON of every other field.
    pub fn with_timestamp(
        parents: Vec<CommitId>,
        message: &str,
        tree: &str,
        timestamp: &str,
    ) -> Self {
        let id = compute_commit_id(&parents, message, tree, timestamp);
        Self {
            id,
            parents,
            message: message.to_string(),
            tree: tree.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    /// First non-empty line of the message, trimmed.
    pub fn summary(&self) -> &str {
        first_line(&self.message)
    }

    /// Recompute the id from the stored fields and compare.
    pub fn verify(&self) -> bool {
        compute_commit_id(&self.parents, &self.message, &self.tree, &self.timestamp) == self.id
    }
}

/// Tree reference for a snapshot's content.
pub fn tree_of(content: &[u8]) -> String {
    sha256_hex(content)
}

pub fn first_line(message: &str) -> &str {
    message
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn compute_commit_id(parents: &[CommitId], message: &str, tree: &str, timestamp: &str) -> CommitId {
    let body = serde_json::json!({
        "parents": parents.iter().map(CommitId::as_str).collect::<Vec<_>>(),
        "message": message,
        "tree": tree,
        "timestamp": timestamp,
    });
    CommitId(sha256_hex(&canonical_json_bytes(&body)))
}

fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
