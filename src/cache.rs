//! On-disk cache of the last scan result.
//!
//! `list` and `grep` persist the scanned version records so the follow-up
//! commands (`cat`, `diff`, `revert`, `restore`) can resolve a short
//! selector back to a concrete version without re-scanning, across process
//! invocations. The cache belongs to exactly one live file at a time;
//! resolution re-checks that and the continued existence of the snapshot
//! copy before handing a record out.

use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use error_set::error_set;
use tracing::debug;

use crate::scan::VersionRecord;

error_set! {
    /// Errors from the on-disk version cache
    CacheError := {
        #[display("no cached scan - run `list` for the file first")]
        NotInitialized,
        #[display("no cached version matches '{selector}'")]
        SelectorNotFound { selector: String },
        #[display("cache was built for '{cached}', not '{requested}' - rerun `list`")]
        Stale { cached: String, requested: String },
        #[display("cached backup '{path}' no longer exists - rerun `list`")]
        Obsolete { path: String },
        #[display("unable to read '{path}': {message}")]
        ReadFailed { path: String, message: String },
        #[display("unable to write cache '{path}': {message}")]
        StoreFailed { path: String, message: String },
        #[display("cache '{path}' is corrupt: {message}")]
        Corrupt { path: String, message: String },
    }
}

/// User-supplied identifier for one cached version: an ordinal from the last
/// `list` output, or a snapshot name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Ordinal(usize),
    Name(String),
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(nr) => Selector::Ordinal(nr),
            Err(_) => Selector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Ordinal(nr) => write!(f, "{nr}"),
            Selector::Name(name) => f.write_str(name),
        }
    }
}

/// Handle to the serialized result of the last scan
pub struct VersionCache {
    path: PathBuf,
}

impl VersionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a scan result, replacing any previous cache
    pub fn store(&self, records: &[VersionRecord]) -> Result<(), CacheError> {
        let store_failed = |message: String| CacheError::StoreFailed {
            path: self.path.display().to_string(),
            message,
        };

        let json = serde_json::to_string_pretty(records).map_err(|e| store_failed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| store_failed(e.to_string()))?;
        }
        fs::write(&self.path, json).map_err(|e| store_failed(e.to_string()))?;

        debug!("cached {} versions in {}", records.len(), self.path.display());
        Ok(())
    }

    /// The cached records, in scan order
    pub fn load(&self) -> Result<Vec<VersionRecord>, CacheError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotInitialized);
            }
            Err(e) => {
                return Err(CacheError::ReadFailed {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_str(&json).map_err(|e| CacheError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve a selector against the cached scan for `requested`.
    ///
    /// Fails when the cache was built for a different file (`Stale`) or when
    /// the resolved record's snapshot copy has since disappeared
    /// (`Obsolete`) - both are cured by rerunning `list`.
    pub fn resolve(
        &self,
        selector: &Selector,
        requested: &Path,
    ) -> Result<VersionRecord, CacheError> {
        let records = self.load()?;

        let record = match selector {
            Selector::Ordinal(nr) => records.get(*nr),
            Selector::Name(name) => records.iter().find(|r| r.snapshot.name == *name),
        }
        .ok_or_else(|| CacheError::SelectorNotFound {
            selector: selector.to_string(),
        })?;

        if record.current.path != requested {
            return Err(CacheError::Stale {
                cached: record.current.path.display().to_string(),
                requested: requested.display().to_string(),
            });
        }
        if !record.backup.path.exists() {
            return Err(CacheError::Obsolete {
                path: record.backup.path.display().to_string(),
            });
        }

        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::scan::{FileLocation, Snapshot};

    fn record(name: &str, backup: &Path, current: &Path) -> VersionRecord {
        VersionRecord {
            snapshot: Snapshot {
                name: name.to_string(),
                created: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            },
            backup: FileLocation {
                path: backup.to_path_buf(),
                modified: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
            },
            current: FileLocation {
                path: current.to_path_buf(),
                modified: Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap(),
            },
        }
    }

    /// Cache plus a live file and two snapshot copies that actually exist
    fn fixture() -> (tempfile::TempDir, VersionCache, Vec<VersionRecord>, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.txt");
        let snap_a = dir.path().join("snap-a.txt");
        let snap_b = dir.path().join("snap-b.txt");
        fs::write(&live, "live\n").unwrap();
        fs::write(&snap_a, "a\n").unwrap();
        fs::write(&snap_b, "b\n").unwrap();

        let records = vec![
            record("snap-a", &snap_a, &live),
            record("snap-b", &snap_b, &live),
        ];
        let cache = VersionCache::new(dir.path().join("cache/last-scan.json"));
        cache.store(&records).unwrap();
        (dir, cache, records, live)
    }

    #[test]
    fn selector_parses_ordinals_and_names() {
        assert_eq!("3".parse::<Selector>().unwrap(), Selector::Ordinal(3));
        assert_eq!("007".parse::<Selector>().unwrap(), Selector::Ordinal(7));
        assert_eq!(
            "zfs-auto-snap_hourly-2026-08-07".parse::<Selector>().unwrap(),
            Selector::Name("zfs-auto-snap_hourly-2026-08-07".to_string())
        );
        assert_eq!(
            "-1".parse::<Selector>().unwrap(),
            Selector::Name("-1".to_string())
        );
    }

    #[test]
    fn store_then_load_roundtrips_records() {
        let (_dir, cache, records, _live) = fixture();
        assert_eq!(cache.load().unwrap(), records);
    }

    #[test]
    fn load_without_store_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let cache = VersionCache::new(dir.path().join("missing.json"));
        assert!(matches!(cache.load(), Err(CacheError::NotInitialized)));
    }

    #[test]
    fn corrupt_cache_is_reported_as_such() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();

        let cache = VersionCache::new(path);
        assert!(matches!(cache.load(), Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn store_overwrites_previous_cache() {
        let (_dir, cache, records, _live) = fixture();
        cache.store(&records[..1]).unwrap();
        assert_eq!(cache.load().unwrap().len(), 1);
    }

    #[test]
    fn ordinal_and_name_resolve_to_the_same_record() {
        let (_dir, cache, records, live) = fixture();

        for (nr, record) in records.iter().enumerate() {
            let by_ordinal = cache.resolve(&Selector::Ordinal(nr), &live).unwrap();
            let by_name = cache
                .resolve(&Selector::Name(record.snapshot.name.clone()), &live)
                .unwrap();
            assert_eq!(by_ordinal, by_name);
            assert_eq!(by_ordinal, *record);
        }
    }

    #[test]
    fn out_of_range_ordinal_is_not_found() {
        let (_dir, cache, _records, live) = fixture();
        let result = cache.resolve(&Selector::Ordinal(2), &live);
        assert!(matches!(result, Err(CacheError::SelectorNotFound { .. })));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let (_dir, cache, _records, live) = fixture();
        let result = cache.resolve(&Selector::Name("snap-z".to_string()), &live);
        assert!(matches!(result, Err(CacheError::SelectorNotFound { .. })));
    }

    #[test]
    fn lookup_for_another_file_is_stale() {
        let (dir, cache, _records, _live) = fixture();
        let other = dir.path().join("other.txt");
        let result = cache.resolve(&Selector::Ordinal(0), &other);
        assert!(matches!(result, Err(CacheError::Stale { .. })));
    }

    #[test]
    fn vanished_backup_is_obsolete() {
        let (_dir, cache, records, live) = fixture();
        fs::remove_file(&records[0].backup.path).unwrap();

        let result = cache.resolve(&Selector::Ordinal(0), &live);
        assert!(matches!(result, Err(CacheError::Obsolete { .. })));

        // The other record still resolves
        assert!(cache.resolve(&Selector::Ordinal(1), &live).is_ok());
    }
}
