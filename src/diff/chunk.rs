use std::ops::Range;

use super::delta::{Delta, DeltaKind};

/// A contiguous group of deltas, padded with up to the configured number of
/// unchanged context lines on each side.
///
/// Chunks never overlap and are ordered by ascending start line. `new_range`
/// is the 0-based span of lines the chunk covers in the newer of the two
/// compared files; the patch engine splices against it when reverting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub deltas: Vec<Delta>,
    pub new_range: Range<usize>,
}

impl Chunk {
    /// 1-based line number the chunk starts at, taken from its first delta
    pub fn start_line(&self) -> usize {
        self.deltas.first().map_or(0, |d| d.line_nr_from)
    }

    /// The chunk's lines as they appear in the older file (Equal + Delete)
    pub fn older_text(&self) -> String {
        self.join_text(|kind| kind != DeltaKind::Insert)
    }

    /// The chunk's lines as they appear in the newer file (Equal + Insert)
    pub fn newer_text(&self) -> String {
        self.join_text(|kind| kind != DeltaKind::Delete)
    }

    /// The chunk's content with its effect undone: deleted lines are
    /// reinstated, inserted lines dropped. Identical to [`older_text`];
    /// the alias names the revert intent at the call site.
    ///
    /// [`older_text`]: Chunk::older_text
    pub fn reverted_text(&self) -> String {
        self.older_text()
    }

    fn join_text(&self, keep: impl Fn(DeltaKind) -> bool) -> String {
        self.deltas
            .iter()
            .filter(|d| keep(d.kind))
            .map(|d| d.text.as_str())
            .collect()
    }
}
