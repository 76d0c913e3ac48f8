use std::fs;
use std::path::{Path, PathBuf};

use error_set::error_set;
use similar::{DiffOp, TextDiff};
use tracing::debug;

use super::chunk::Chunk;
use super::delta::{Delta, DeltaKind};

error_set! {
    /// Errors from computing a diff between two file versions
    DiffError := {
        #[display("unable to read '{path}': {message}")]
        Unreadable { path: String, message: String },
    }
}

/// A line-level diff between two file versions.
///
/// `older` and `newer` identify the compared locations; `chunks` are ordered
/// by ascending start line and never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub older: PathBuf,
    pub newer: PathBuf,
    pub chunks: Vec<Chunk>,
}

/// Diff two files on disk.
///
/// `context_size` bounds the unchanged lines kept around each change region;
/// regions separated by more than `2 * context_size` unchanged lines end up
/// in separate chunks, closer regions merge into one.
pub fn compute_diff(older: &Path, newer: &Path, context_size: usize) -> Result<Diff, DiffError> {
    let old = read(older)?;
    let new = read(newer)?;
    Ok(diff_contents(older, newer, &old, &new, context_size))
}

/// Diff two already-loaded contents, labelled with their locations
pub fn diff_contents(
    older: &Path,
    newer: &Path,
    old: &str,
    new: &str,
    context_size: usize,
) -> Diff {
    let text_diff = TextDiff::from_lines(old, new);
    let old_lines = text_diff.old_slices();
    let new_lines = text_diff.new_slices();

    let mut chunks = Vec::new();
    for group in text_diff.grouped_ops(context_size) {
        let mut deltas = Vec::new();
        let mut new_range: Option<(usize, usize)> = None;

        for op in &group {
            if op.old_range().is_empty() && op.new_range().is_empty() {
                continue;
            }
            let nr = op.new_range();
            new_range = Some(match new_range {
                Some((start, end)) => (start.min(nr.start), end.max(nr.end)),
                None => (nr.start, nr.end),
            });

            match *op {
                DiffOp::Equal { old_index, len, .. } => {
                    deltas.push(Delta::new(
                        DeltaKind::Equal,
                        old_lines[old_index..old_index + len].concat(),
                        old_index + 1,
                    ));
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    deltas.push(Delta::new(
                        DeltaKind::Delete,
                        old_lines[old_index..old_index + old_len].concat(),
                        old_index + 1,
                    ));
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    deltas.push(Delta::new(
                        DeltaKind::Insert,
                        new_lines[new_index..new_index + new_len].concat(),
                        new_index + 1,
                    ));
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    deltas.push(Delta::new(
                        DeltaKind::Delete,
                        old_lines[old_index..old_index + old_len].concat(),
                        old_index + 1,
                    ));
                    deltas.push(Delta::new(
                        DeltaKind::Insert,
                        new_lines[new_index..new_index + new_len].concat(),
                        new_index + 1,
                    ));
                }
            }
        }

        // A group with only unchanged lines is no chunk at all
        if !deltas.iter().any(|d| d.kind != DeltaKind::Equal) {
            continue;
        }
        if let Some((start, end)) = new_range {
            chunks.push(Chunk {
                deltas,
                new_range: start..end,
            });
        }
    }

    debug!(
        chunks = chunks.len(),
        "diffed {} against {}",
        older.display(),
        newer.display()
    );

    Diff {
        older: older.to_path_buf(),
        newer: newer.to_path_buf(),
        chunks,
    }
}

fn read(path: &Path) -> Result<String, DiffError> {
    fs::read_to_string(path).map_err(|e| DiffError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
