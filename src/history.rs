//! Pattern search across the version history.
//!
//! Walks every adjacent pair of versions - newest against the live file,
//! each older one against its successor - and reports the changed lines
//! matching a pattern. Unchanged lines are never searched: the walk surfaces
//! what actually changed at each snapshot boundary, chronologically.

use chrono::{DateTime, Utc};
use error_set::error_set;
use tracing::debug;

use crate::diff::{DeltaKind, DiffError, compute_diff};
use crate::fsutil;
use crate::scan::{Snapshot, VersionRecord};

error_set! {
    /// Errors from walking the version history
    GrepError := {
        #[display("unable to stat '{path}': {message}")]
        Stat { path: String, message: String },
        DiffError(DiffError),
    }
}

/// One matching changed line found in the version history
#[derive(Debug, Clone, PartialEq)]
pub struct GrepMatch {
    /// Index of the version whose transition introduced the change
    pub version_index: usize,
    pub snapshot: Snapshot,
    /// Modification time of the newer side of the transition
    pub newer_modified: DateTime<Utc>,
    /// 1-based line number of the match within the changed file
    pub line_nr: usize,
    pub kind: DeltaKind,
    /// The matching line, trimmed
    pub line: String,
}

impl GrepMatch {
    /// `+` for inserted lines, `-` for deleted ones
    pub fn marker(&self) -> char {
        self.kind.marker()
    }
}

/// Search every change between adjacent versions for `pattern`.
///
/// Matching is a case-folded substring test per line. A delta spanning
/// several lines reports `line_nr_from` plus the line's offset inside the
/// delta.
pub fn grep_history(
    records: &[VersionRecord],
    pattern: &str,
    context_size: usize,
) -> Result<Vec<GrepMatch>, GrepError> {
    let needle = pattern.to_lowercase();
    let mut matches = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let older = record.backup.path.as_path();
        let newer = if index == 0 {
            record.current.path.as_path()
        } else {
            records[index - 1].backup.path.as_path()
        };
        let newer_modified = fsutil::modified_at(newer).map_err(|e| GrepError::Stat {
            path: newer.display().to_string(),
            message: e.to_string(),
        })?;

        let diff = compute_diff(older, newer, context_size)?;
        for chunk in &diff.chunks {
            for delta in &chunk.deltas {
                if delta.kind == DeltaKind::Equal {
                    continue;
                }
                for (offset, line) in delta.text.lines().enumerate() {
                    if line.to_lowercase().contains(&needle) {
                        matches.push(GrepMatch {
                            version_index: index,
                            snapshot: record.snapshot.clone(),
                            newer_modified,
                            line_nr: delta.line_nr_from + offset,
                            kind: delta.kind,
                            line: line.trim().to_string(),
                        });
                    }
                }
            }
        }
    }

    debug!("{} lines matched '{}'", matches.len(), pattern);
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use chrono::Utc;

    use super::*;
    use crate::scan::FileLocation;

    fn location(path: &Path) -> FileLocation {
        FileLocation {
            path: path.to_path_buf(),
            modified: Utc::now(),
        }
    }

    fn record(name: &str, backup: &Path, current: &Path) -> VersionRecord {
        VersionRecord {
            snapshot: Snapshot {
                name: name.to_string(),
                created: Utc::now(),
            },
            backup: location(backup),
            current: location(current),
        }
    }

    #[test]
    fn multi_line_delta_offsets_add_up() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap.txt");
        let live = dir.path().join("live.txt");

        // Lines 10-12 of the snapshot version were deleted; the needle sits
        // on the third deleted line
        let kept: String = (1..=9).map(|n| format!("line {n}\n")).collect();
        fs::write(&snap, format!("{kept}gone one\ngone two\ngone needle three\n")).unwrap();
        fs::write(&live, &kept).unwrap();

        let records = vec![record("snap-1", &snap, &live)];
        let matches = grep_history(&records, "needle", 0).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line_nr, 12);
        assert_eq!(matches[0].kind, DeltaKind::Delete);
        assert_eq!(matches[0].marker(), '-');
        assert_eq!(matches[0].line, "gone needle three");
    }

    #[test]
    fn matching_is_case_folded_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap.txt");
        let live = dir.path().join("live.txt");
        fs::write(&snap, "unchanged\n").unwrap();
        fs::write(&live, "unchanged\n   added NEEDLE line   \n").unwrap();

        let records = vec![record("snap-1", &snap, &live)];
        let matches = grep_history(&records, "needle", 0).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, DeltaKind::Insert);
        assert_eq!(matches[0].line, "added NEEDLE line");
    }

    #[test]
    fn walk_pairs_each_version_with_its_successor() {
        let dir = tempfile::tempdir().unwrap();
        let snap_old = dir.path().join("snap-old.txt");
        let snap_new = dir.path().join("snap-new.txt");
        let live = dir.path().join("live.txt");

        // The needle arrived between snap-old and snap-new, then survived
        fs::write(&snap_old, "start\n").unwrap();
        fs::write(&snap_new, "start\nneedle\n").unwrap();
        fs::write(&live, "start\nneedle\nmore\n").unwrap();

        let records = vec![
            record("snap-new", &snap_new, &live),
            record("snap-old", &snap_old, &live),
        ];
        let matches = grep_history(&records, "needle", 0).unwrap();

        // Only the snap-old -> snap-new transition inserted it
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].version_index, 1);
        assert_eq!(matches[0].snapshot.name, "snap-old");
        assert_eq!(matches[0].kind, DeltaKind::Insert);
        assert_eq!(matches[0].line_nr, 2);
    }

    #[test]
    fn unchanged_lines_are_never_searched() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap.txt");
        let live = dir.path().join("live.txt");
        fs::write(&snap, "needle stays\nold\n").unwrap();
        fs::write(&live, "needle stays\nnew\n").unwrap();

        let records = vec![record("snap-1", &snap, &live)];

        // Generous context puts the needle line into Equal deltas; it must
        // still not match
        let matches = grep_history(&records, "needle", 10).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn missing_version_file_fails_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.txt");
        fs::write(&live, "x\n").unwrap();

        let records = vec![record("snap-1", &dir.path().join("absent.txt"), &live)];
        let result = grep_history(&records, "x", 0);
        assert!(matches!(
            result,
            Err(GrepError::DiffError(DiffError::Unreadable { .. }))
        ));
    }
}
