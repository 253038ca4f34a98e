//! Patch names: validation of user-supplied names and derivation of names
//! from commit messages.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::commit::first_line;
use crate::error::StackError;

/// Default cap on the length of a name derived from a commit message.
pub const DEFAULT_NAME_LENGTH: usize = 30;

/// Name used when a message yields no usable characters.
const PLACEHOLDER: &str = "patch";

const RESERVED_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\', '/'];

/// A syntactically valid patch name. Uniqueness is a property of a
/// [`Series`](crate::series::Series), not of the name itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatchName(String);

impl PatchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a name from the first line of `message`: lower-cased, every run
    /// of non-alphanumeric characters collapsed to a single `-`, trimmed of
    /// `-` at both ends and cut to `len_limit` characters.
    pub fn slug(message: &str, len_limit: Option<usize>) -> PatchName {
        let mut slug = String::new();
        let mut pending_dash = false;
        for c in first_line(message).chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if let Some(limit) = len_limit.filter(|&n| n > 0) {
            let cut = truncated(&slug, limit).len();
            slug.truncate(cut);
        }

        if slug.is_empty() {
            slug.push_str(PLACEHOLDER);
        }
        PatchName(slug)
    }

    /// Like [`PatchName::slug`], then append `-1`, `-2`, ... until the name is
    /// not in `taken`. The slug is shortened so the suffixed name stays within
    /// `len_limit`. Never fails.
    pub fn make_unique(
        message: &str,
        len_limit: Option<usize>,
        taken: &BTreeSet<PatchName>,
    ) -> PatchName {
        let base = Self::slug(message, len_limit);
        if !taken.contains(&base) {
            return base;
        }
        let limit = len_limit.filter(|&n| n > 0);
        (1u64..)
            .map(|n| {
                let suffix = format!("-{n}");
                let stem = match limit {
                    // Keep at least one character so the name never starts with `-`.
                    Some(limit) => truncated(&base.0, limit.saturating_sub(suffix.len()).max(1)),
                    None => base.0.as_str(),
                };
                PatchName(format!("{stem}{suffix}"))
            })
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or(base)
    }

    /// Expand a prefix into `prefix1`, `prefix2`, ... `prefixN`.
    pub fn numbered(&self, count: usize) -> Vec<PatchName> {
        (1..=count)
            .map(|i| PatchName(format!("{}{i}", self.0)))
            .collect()
    }
}

/// First `max` characters of `s` without trailing `-`.
fn truncated(s: &str, max: usize) -> &str {
    let cut = s.char_indices().nth(max).map_or(s.len(), |(i, _)| i);
    s[..cut].trim_end_matches('-')
}

fn check_syntax(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.contains("..") {
        return Err("name contains `..`");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("name contains whitespace or control characters");
    }
    if name.contains(RESERVED_CHARS) {
        return Err("name contains one of `~ ^ : ? * [ \\ /`");
    }
    if name.contains("@{") {
        return Err("name contains `@{`");
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err("name starts with `.` or `-`");
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Err("name ends with `.` or `.lock`");
    }
    Ok(())
}

impl FromStr for PatchName {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_syntax(s).map_err(|reason| StackError::InvalidName {
            name: s.to_string(),
            reason,
        })?;
        Ok(PatchName(s.to_string()))
    }
}

impl TryFrom<String> for PatchName {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatchName> for String {
    fn from(name: PatchName) -> Self {
        name.0
    }
}

impl AsRef<str> for PatchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn names(list: &[&str]) -> BTreeSet<PatchName> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn accepts_ordinary_names() {
        for ok in ["foo", "foo-bar", "fix_1", "v1.2", "über"] {
            assert!(ok.parse::<PatchName>().is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_double_dot() {
        let err = "bad..patchname".parse::<PatchName>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);
        assert!(err.to_string().contains("bad..patchname"));
    }

    #[test]
    fn rejects_ref_unsafe_names() {
        for bad in ["", "a b", "a/b", "a:b", ".hidden", "-opt", "x.lock", "x.", "a@{1}", "tab\t"] {
            assert!(bad.parse::<PatchName>().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn slug_collapses_punctuation_and_case() {
        assert_eq!(PatchName::slug("Foo Patch", None).as_str(), "foo-patch");
        assert_eq!(
            PatchName::slug("  Fix: parser -- crash (again)!\nbody", None).as_str(),
            "fix-parser-crash-again"
        );
    }

    #[test]
    fn slug_of_empty_message_is_placeholder() {
        assert_eq!(PatchName::slug("", None).as_str(), "patch");
        assert_eq!(PatchName::slug("!!! ???", None).as_str(), "patch");
    }

    #[test]
    fn slug_respects_length_without_trailing_dash() {
        let n = PatchName::slug("abcd efgh ijkl", Some(5));
        assert_eq!(n.as_str(), "abcd");
        let n = PatchName::slug("abcd efgh ijkl", Some(7));
        assert_eq!(n.as_str(), "abcd-ef");
    }

    #[test]
    fn slugs_are_always_valid_names() {
        for msg in ["Foo Patch", "--x--", "Ünïcode ✓ title", "a..b", "x.lock"] {
            let slug = PatchName::slug(msg, Some(DEFAULT_NAME_LENGTH));
            assert!(slug.as_str().parse::<PatchName>().is_ok(), "{msg} -> {slug}");
        }
    }

    #[test]
    fn make_unique_appends_counter() {
        let taken = names(&["bar-patch", "bar-patch-1"]);
        let n = PatchName::make_unique("Bar Patch", None, &taken);
        assert_eq!(n.as_str(), "bar-patch-2");
        let n = PatchName::make_unique("Other", None, &taken);
        assert_eq!(n.as_str(), "other");
    }

    #[test]
    fn make_unique_keeps_suffixed_names_within_limit() {
        let mut taken = names(&["abcdefghij"]);
        let n = PatchName::make_unique("abcdefghij klm", Some(10), &taken);
        assert_eq!(n.as_str(), "abcdefgh-1");

        taken.extend((1..=9).map(|i| PatchName(format!("abcdefgh-{i}"))));
        let n = PatchName::make_unique("abcdefghij klm", Some(10), &taken);
        assert_eq!(n.as_str(), "abcdefg-10");
        assert!(n.as_str().chars().count() <= 10);
    }

    #[test]
    fn make_unique_never_leaves_a_dangling_dash() {
        let taken = names(&["ab-cd"]);
        let n = PatchName::make_unique("ab cd", Some(5), &taken);
        assert_eq!(n.as_str(), "ab-1");
        assert!(n.as_str().parse::<PatchName>().is_ok());
    }

    #[test]
    fn numbered_expansion() {
        let prefix: PatchName = "foobar".parse().unwrap();
        let expanded: Vec<String> = prefix.numbered(3).into_iter().map(String::from).collect();
        assert_eq!(expanded, ["foobar1", "foobar2", "foobar3"]);
    }
}
