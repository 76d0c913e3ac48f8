//! Find, diff, selectively revert and grep older versions of a file in
//! volume snapshots.
//!
//! A scan produces an ordered list of [`VersionRecord`]s (index 0 nearest to
//! now) and caches it on disk, so follow-up commands can address a version
//! with a short [`Selector`] - the ordinal from the last `list` output or
//! the snapshot name - without re-scanning. Diffs are grouped into
//! independently revertible chunks; every mutation of the live file takes a
//! timestamped backup first.

use std::fs;
use std::path::{Path, PathBuf};

use error_set::error_set;

pub mod cache;
pub mod config;
pub mod diff;
pub mod fsutil;
pub mod history;
pub mod patch;
pub mod render;
pub mod scan;

pub use cache::{CacheError, Selector, VersionCache};
pub use config::{Config, ConfigError};
pub use diff::{Chunk, Delta, DeltaKind, Diff, DiffError};
pub use history::{GrepError, GrepMatch};
pub use patch::PatchError;
pub use scan::{
    FileLocation, ScanError, Snapshot, SnapshotDirScanner, VersionRecord, VersionScanner,
};

error_set! {
    /// Top-level error for snaphist operations
    AppError := {
        #[display("unable to resolve '{path}': {message}")]
        InvalidPath { path: String, message: String },
        #[display("unable to read '{path}': {message}")]
        ReadFailed { path: String, message: String },
        ConfigError(ConfigError),
        ScanError(ScanError),
        CacheError(CacheError),
        DiffError(DiffError),
        PatchError(PatchError),
        GrepError(GrepError),
    }
}

/// Main interface for version-history operations.
///
/// Owns the configuration and the cache handle; the scanner is handed in
/// where a command actually scans, so selector-based commands work without
/// one.
pub struct Snaphist {
    config: Config,
    cache: VersionCache,
}

impl Snaphist {
    pub fn new(config: Config, cache: VersionCache) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan for older versions of `file` and remember the result for
    /// follow-up selector lookups
    pub fn list(
        &self,
        scanner: &dyn VersionScanner,
        file: &Path,
    ) -> Result<Vec<VersionRecord>, AppError> {
        let records = scanner.find_versions(file)?;
        self.cache.store(&records)?;
        Ok(records)
    }

    /// Content of the selected version's snapshot copy
    pub fn cat(&self, file: &Path, selector: &Selector) -> Result<String, AppError> {
        let record = self.cache.resolve(selector, file)?;
        fs::read_to_string(&record.backup.path).map_err(|e| AppError::ReadFailed {
            path: record.backup.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Diff from the selected version to the live file
    pub fn diff(&self, file: &Path, selector: &Selector) -> Result<(VersionRecord, Diff), AppError> {
        let record = self.cache.resolve(selector, file)?;
        let diff = diff::compute_diff(&record.backup.path, file, self.config.context_size)?;
        Ok((record, diff))
    }

    /// Undo one chunk of the diff against the selected version.
    ///
    /// Returns the backup taken of the live file plus the reverted chunk,
    /// for display.
    pub fn revert(
        &self,
        file: &Path,
        selector: &Selector,
        chunk_nr: usize,
    ) -> Result<(PathBuf, Chunk), AppError> {
        let (_, diff) = self.diff(file, selector)?;
        let chunk = diff
            .chunks
            .get(chunk_nr)
            .ok_or(PatchError::ChunkOutOfRange {
                given: chunk_nr,
                count: diff.chunks.len(),
            })?;
        let backup = patch::revert_chunk(file, chunk)?;
        Ok((backup, chunk.clone()))
    }

    /// Replace the live file wholly with the selected version's content
    pub fn restore(
        &self,
        file: &Path,
        selector: &Selector,
    ) -> Result<(PathBuf, VersionRecord), AppError> {
        let record = self.cache.resolve(selector, file)?;
        let backup = patch::restore_version(&record)?;
        Ok((backup, record))
    }

    /// Scan and search every change between adjacent versions.
    ///
    /// Also refreshes the cache, so the reported version indexes stay
    /// addressable by the follow-up commands.
    pub fn grep(
        &self,
        scanner: &dyn VersionScanner,
        file: &Path,
        pattern: &str,
    ) -> Result<(Vec<VersionRecord>, Vec<GrepMatch>), AppError> {
        let records = self.list(scanner, file)?;
        let matches = history::grep_history(&records, pattern, self.config.context_size)?;
        Ok((records, matches))
    }
}
