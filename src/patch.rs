//! Mutation of the live file: reverting a single chunk and restoring a whole
//! version. Both back the live file up first and only then write; a failed
//! backup means the file is never touched, and a failed write reports where
//! the backup landed so the operator can recover by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use error_set::error_set;
use tracing::debug;

use crate::diff::Chunk;
use crate::fsutil;
use crate::scan::VersionRecord;

error_set! {
    /// Errors from mutating the live file
    PatchError := {
        #[display("chunk {given} is out of range - valid range: 0..{count}")]
        ChunkOutOfRange { given: usize, count: usize },
        #[display("chunk covers lines {start}..{end} but '{path}' has {lines} lines - rerun `diff`")]
        RangeMismatch {
            path: String,
            start: usize,
            end: usize,
            lines: usize,
        },
        #[display("unable to read '{path}': {message}")]
        ReadFailed { path: String, message: String },
        #[display("unable to back up '{path}': {message}")]
        BackupFailed { path: String, message: String },
        #[display("wrote backup to '{backup}' but updating '{path}' failed: {message}")]
        WriteFailed {
            path: String,
            backup: String,
            message: String,
        },
    }
}

/// Undo the effect of one chunk on `target`.
///
/// Deleted lines come back, inserted lines go, and everything outside the
/// chunk - unchanged context and all other chunks - stays exactly as it is
/// in the live file. The chunk must come from a diff computed between a
/// snapshot copy (older) and the live file (newer). Returns the location of
/// the safety copy taken before the write.
pub fn revert_chunk(target: &Path, chunk: &Chunk) -> Result<PathBuf, PatchError> {
    revert_chunk_with(target, chunk, fsutil::backup_file, |path, content| {
        fs::write(path, content)
    })
}

fn revert_chunk_with(
    target: &Path,
    chunk: &Chunk,
    backup: impl FnOnce(&Path) -> io::Result<PathBuf>,
    write: impl FnOnce(&Path, &str) -> io::Result<()>,
) -> Result<PathBuf, PatchError> {
    let content = fs::read_to_string(target).map_err(|e| PatchError::ReadFailed {
        path: target.display().to_string(),
        message: e.to_string(),
    })?;
    let patched = splice_reverted(&content, chunk, target)?;

    let backup_path = backup(target).map_err(|e| PatchError::BackupFailed {
        path: target.display().to_string(),
        message: e.to_string(),
    })?;
    write(target, &patched).map_err(|e| PatchError::WriteFailed {
        path: target.display().to_string(),
        backup: backup_path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(
        "reverted lines {}..{} of {}",
        chunk.new_range.start,
        chunk.new_range.end,
        target.display()
    );
    Ok(backup_path)
}

/// The live content with the chunk's span replaced by its reverted text
fn splice_reverted(content: &str, chunk: &Chunk, path: &Path) -> Result<String, PatchError> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    if chunk.new_range.end > lines.len() {
        return Err(PatchError::RangeMismatch {
            path: path.display().to_string(),
            start: chunk.new_range.start,
            end: chunk.new_range.end,
            lines: lines.len(),
        });
    }

    let mut patched = String::with_capacity(content.len());
    for line in &lines[..chunk.new_range.start] {
        patched.push_str(line);
    }
    patched.push_str(&chunk.reverted_text());
    for line in &lines[chunk.new_range.end..] {
        patched.push_str(line);
    }
    Ok(patched)
}

/// Replace the live file wholly with the version's snapshot copy.
///
/// Same ordering guarantee as [`revert_chunk`]: the live file is backed up
/// before it is overwritten.
pub fn restore_version(record: &VersionRecord) -> Result<PathBuf, PatchError> {
    restore_version_with(record, fsutil::backup_file)
}

fn restore_version_with(
    record: &VersionRecord,
    backup: impl FnOnce(&Path) -> io::Result<PathBuf>,
) -> Result<PathBuf, PatchError> {
    let target = &record.current.path;

    let backup_path = backup(target).map_err(|e| PatchError::BackupFailed {
        path: target.display().to_string(),
        message: e.to_string(),
    })?;
    fs::copy(&record.backup.path, target).map_err(|e| PatchError::WriteFailed {
        path: target.display().to_string(),
        backup: backup_path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(
        "restored {} from {}",
        target.display(),
        record.snapshot.name
    );
    Ok(backup_path)
}
