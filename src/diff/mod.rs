//! Line-level diff model between two file versions.
//!
//! [`compute_diff`] runs the `similar` text-diff algorithm over two files
//! and regroups its output into [`Chunk`]s of [`Delta`]s: contiguous change
//! regions padded with unchanged context lines, independently revertible by
//! the patch engine.

pub mod chunk;
pub mod delta;
pub mod engine;

pub use chunk::Chunk;
pub use delta::{Delta, DeltaKind};
pub use engine::{Diff, DiffError, compute_diff, diff_contents};
