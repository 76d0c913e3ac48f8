//! Version records and the snapshot scanner.
//!
//! Scanning is the outer edge of the system: everything downstream consumes
//! the ordered [`VersionRecord`] list and nothing else. The bundled
//! [`SnapshotDirScanner`] covers the common case of snapshot container
//! directories exposed inside the volume (`.zfs/snapshot`, `.snapshots`);
//! anything smarter can slot in behind [`VersionScanner`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use error_set::error_set;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::fsutil;

error_set! {
    /// Errors from scanning snapshots for older file versions
    ScanError := {
        #[display("no snapshot directory found above '{path}'")]
        NoSnapshotDir { path: String },
        #[display("'{file}' is not inside the scanned volume '{mount}'")]
        OutsideMount { file: String, mount: String },
        #[display("unable to scan '{path}': {message}")]
        ScanFailed { path: String, message: String },
    }
}

/// One point-in-time copy of the containing volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub created: DateTime<Utc>,
}

/// One concrete file instance, either inside a snapshot or the live file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLocation {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// The scanned file as it existed in one snapshot.
///
/// `backup` is the copy inside `snapshot`; `current` is the live path and is
/// shared by every record of one scan. Records are produced newest-first:
/// index 0 is the version nearest to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub snapshot: Snapshot,
    pub backup: FileLocation,
    pub current: FileLocation,
}

/// Produces the ordered version list for a file
pub trait VersionScanner {
    fn find_versions(&self, file: &Path) -> Result<Vec<VersionRecord>, ScanError>;
}

/// Scanner over snapshot container directories.
///
/// A container holds one subdirectory per snapshot, each mirroring the
/// volume's tree, so a file's older copy lives at
/// `<container>/<snapshot>/<path relative to the mount>`.
pub struct SnapshotDirScanner {
    mount: PathBuf,
    container: PathBuf,
    days_to_scan: u32,
}

impl SnapshotDirScanner {
    pub fn new(mount: PathBuf, container: PathBuf, days_to_scan: u32) -> Self {
        Self {
            mount,
            container,
            days_to_scan,
        }
    }

    /// Walk `file`'s ancestors until one contains a snapshot container
    /// named in the configuration
    pub fn locate(file: &Path, config: &Config) -> Result<Self, ScanError> {
        for dir in file.ancestors().skip(1) {
            for name in &config.snapshot_dirs {
                let container = dir.join(name);
                if container.is_dir() {
                    debug!(
                        "using snapshot container {} for {}",
                        container.display(),
                        file.display()
                    );
                    return Ok(Self::new(
                        dir.to_path_buf(),
                        container,
                        config.days_to_scan,
                    ));
                }
            }
        }

        Err(ScanError::NoSnapshotDir {
            path: file.display().to_string(),
        })
    }

    /// All snapshots in the container within the scan window, newest first
    fn snapshots(&self) -> Result<Vec<Snapshot>, ScanError> {
        let entries = fs::read_dir(&self.container).map_err(|e| ScanError::ScanFailed {
            path: self.container.display().to_string(),
            message: e.to_string(),
        })?;

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ScanError::ScanFailed {
                path: self.container.display().to_string(),
                message: e.to_string(),
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let created = match fsutil::modified_at(&entry.path()) {
                Ok(created) => created,
                Err(_) => continue,
            };
            snapshots.push(Snapshot {
                name: entry.file_name().to_string_lossy().into_owned(),
                created,
            });
        }

        if self.days_to_scan > 0 {
            let cutoff = Utc::now() - Duration::days(i64::from(self.days_to_scan));
            snapshots.retain(|s| s.created >= cutoff);
        }

        // Equal creation times fall back to the name so enumeration stays
        // deterministic
        snapshots.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
        Ok(snapshots)
    }
}

impl VersionScanner for SnapshotDirScanner {
    fn find_versions(&self, file: &Path) -> Result<Vec<VersionRecord>, ScanError> {
        let rel = file
            .strip_prefix(&self.mount)
            .map_err(|_| ScanError::OutsideMount {
                file: file.display().to_string(),
                mount: self.mount.display().to_string(),
            })?;

        let scan_failed = |path: &Path| {
            let path = path.display().to_string();
            move |e: std::io::Error| ScanError::ScanFailed {
                path,
                message: e.to_string(),
            }
        };

        let current = FileLocation {
            path: file.to_path_buf(),
            modified: fsutil::modified_at(file).map_err(scan_failed(file))?,
        };
        let mut last_seen = fsutil::content_hash(file).map_err(scan_failed(file))?;

        let mut records = Vec::new();
        for snapshot in self.snapshots()? {
            let backup_path = self.container.join(&snapshot.name).join(rel);
            if !backup_path.is_file() {
                continue;
            }
            let hash = match fsutil::content_hash(&backup_path) {
                Ok(hash) => hash,
                // Snapshot pruned mid-scan
                Err(_) => continue,
            };
            if hash == last_seen {
                debug!("{} unchanged in {}", rel.display(), snapshot.name);
                continue;
            }
            last_seen = hash;

            let modified = fsutil::modified_at(&backup_path).map_err(scan_failed(&backup_path))?;
            records.push(VersionRecord {
                snapshot,
                backup: FileLocation {
                    path: backup_path,
                    modified,
                },
                current: current.clone(),
            });
        }

        debug!(
            "found {} distinct versions of {}",
            records.len(),
            file.display()
        );
        Ok(records)
    }
}
