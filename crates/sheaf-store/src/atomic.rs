use std::fs;
use std::io::Write;
use std::path::Path;

/// Atomic write: write to temp file in same dir, then rename.
/// Readers see either the old content or the new content, never a mix.
pub fn write_atomic(path: &Path, data: &[u8], fsync: bool) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("no parent dir for {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    if fsync {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_and_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("test.txt");
        write_atomic(&path, b"hello world", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
        write_atomic(&path, b"bye", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "bye");
        // No temp files left behind
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
