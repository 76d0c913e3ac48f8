/// Classification of one contiguous run of lines within a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// Lines present in both compared files
    Equal,
    /// Lines present only in the newer file
    Insert,
    /// Lines present only in the older file
    Delete,
}

impl DeltaKind {
    /// Marker character used in grep output and plain diff rendering
    pub fn marker(self) -> char {
        match self {
            DeltaKind::Equal => ' ',
            DeltaKind::Insert => '+',
            DeltaKind::Delete => '-',
        }
    }
}

/// One classified run of lines from a diff.
///
/// `text` spans one or more newline-terminated lines (the final line may
/// lack its terminator when the file does). `line_nr_from` is the 1-based
/// number of the first line of `text` in the older file for `Equal` and
/// `Delete`, and in the newer file for `Insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub kind: DeltaKind,
    pub text: String,
    pub line_nr_from: usize,
}

impl Delta {
    pub fn new(kind: DeltaKind, text: impl Into<String>, line_nr_from: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line_nr_from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_per_kind() {
        assert_eq!(DeltaKind::Insert.marker(), '+');
        assert_eq!(DeltaKind::Delete.marker(), '-');
        assert_eq!(DeltaKind::Equal.marker(), ' ');
    }
}
