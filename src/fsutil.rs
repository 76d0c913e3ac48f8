//! File-system capabilities shared by the scanner and the patch engine:
//! timestamped safety copies, content identity, and modification times.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// Create a timestamped copy of `path` next to it and return its location.
///
/// Every mutating operation calls this before touching the live file; the
/// copy is the sole recovery path if the mutation goes wrong.
pub fn backup_file(path: &Path) -> io::Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let backup = PathBuf::from(format!("{}.{}.bak", path.display(), stamp));
    fs::copy(path, &backup)?;
    debug!("backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}

/// Content identity of a file, for spotting distinct versions during a scan
pub fn content_hash(path: &Path) -> io::Result<u64> {
    Ok(xxh64(&fs::read(path)?, 0))
}

/// Modification time of `path` as a UTC timestamp
pub fn modified_at(path: &Path) -> io::Result<DateTime<Utc>> {
    Ok(fs::metadata(path)?.modified()?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_copies_content_next_to_original() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "content\n").unwrap();

        let backup = backup_file(&file).unwrap();

        assert_eq!(backup.parent(), file.parent());
        assert!(
            backup
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap()
                .starts_with("notes.txt.")
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "content\n");
        assert_eq!(fs::read_to_string(&file).unwrap(), "content\n");
    }

    #[test]
    fn backup_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(backup_file(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn content_hash_distinguishes_versions() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        fs::write(&a, "same\n").unwrap();
        fs::write(&b, "same\n").unwrap();
        fs::write(&c, "different\n").unwrap();

        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
        assert_ne!(content_hash(&a).unwrap(), content_hash(&c).unwrap());
    }

    #[test]
    fn modified_at_reports_recent_time() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "x").unwrap();

        let age = Utc::now() - modified_at(&file).unwrap();
        assert!(age < chrono::Duration::minutes(5));
    }
}
