//! Human-readable rendering of diffs.
//!
//! Plain mode prefixes every non-empty line with `+ ` / `- ` / `  `; colored
//! mode wraps inserted and deleted runs in bright ANSI colors and leaves
//! unchanged text verbatim. Both modes share one traversal.

use colored::Colorize;

use crate::diff::{Chunk, Delta, DeltaKind, Diff};

/// Render a whole diff, one headed section per chunk.
///
/// Every chunk gets a three-line header: a rule of `=`, the line
/// `Chunk <index> - starting at line <line>`, and a rule of `-`, with both
/// rules sized to the header text. A newline follows each chunk's deltas.
pub fn render_diff(diff: &Diff, color: bool) -> String {
    let mut out = String::new();

    for (nr, chunk) in diff.chunks.iter().enumerate() {
        let header = format!("Chunk {} - starting at line {}", nr, chunk.start_line());
        out.push_str(&"=".repeat(header.len()));
        out.push('\n');
        out.push_str(&header);
        out.push('\n');
        out.push_str(&"-".repeat(header.len()));
        out.push('\n');
        out.push_str(&render_chunk(chunk, color));
        out.push('\n');
    }

    out
}

/// Render a single, already-selected chunk without a header
pub fn render_chunk(chunk: &Chunk, color: bool) -> String {
    chunk.deltas.iter().map(|d| render_delta(d, color)).collect()
}

fn render_delta(delta: &Delta, color: bool) -> String {
    if color {
        return match delta.kind {
            DeltaKind::Insert => delta.text.bright_green().to_string(),
            DeltaKind::Delete => delta.text.bright_red().to_string(),
            DeltaKind::Equal => delta.text.clone(),
        };
    }

    let prefix = match delta.kind {
        DeltaKind::Insert => "+ ",
        DeltaKind::Delete => "- ",
        DeltaKind::Equal => "  ",
    };
    prefix_lines(&delta.text, prefix)
}

/// Prefix every non-empty line, preserving the original line breaks. The
/// empty fragment after a trailing newline stays unprefixed, so the text's
/// final terminator is kept as-is.
fn prefix_lines(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use similar_asserts::assert_eq;

    use super::*;
    use crate::diff::diff_contents;

    fn replacement_diff() -> Diff {
        diff_contents(Path::new("older"), Path::new("newer"), "A\nB\nC\n", "A\nX\nC\n", 1)
    }

    #[test]
    fn plain_render_matches_line_format() {
        let diff = replacement_diff();
        let rendered = render_diff(&diff, false);

        let header = "Chunk 0 - starting at line 1";
        let expected = format!(
            "{rule_eq}\n{header}\n{rule_dash}\n  A\n- B\n+ X\n  C\n\n",
            rule_eq = "=".repeat(header.len()),
            rule_dash = "-".repeat(header.len()),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn chunk_render_has_no_header() {
        let diff = replacement_diff();
        let rendered = render_chunk(&diff.chunks[0], false);
        assert_eq!(rendered, "  A\n- B\n+ X\n  C\n");
    }

    #[test]
    fn header_indexes_count_chunks() {
        let old: String = (1..=20).map(|n| format!("line {n}\n")).collect();
        let new = old
            .replace("line 2\n", "LINE 2\n")
            .replace("line 19\n", "LINE 19\n");
        let diff = diff_contents(Path::new("a"), Path::new("b"), &old, &new, 1);
        let rendered = render_diff(&diff, false);

        assert!(rendered.contains("Chunk 0 - starting at line 1"));
        assert!(rendered.contains("Chunk 1 - starting at line 18"));
    }

    #[test]
    fn empty_lines_stay_unprefixed() {
        let chunk = Chunk {
            deltas: vec![Delta::new(DeltaKind::Insert, "one\n\ntwo\n", 4)],
            new_range: 3..6,
        };
        assert_eq!(render_chunk(&chunk, false), "+ one\n\n+ two\n");
    }

    #[test]
    fn missing_trailing_newline_keeps_last_line_prefixed() {
        let chunk = Chunk {
            deltas: vec![Delta::new(DeltaKind::Delete, "one\ntwo", 1)],
            new_range: 0..0,
        };
        assert_eq!(render_chunk(&chunk, false), "- one\n- two");
    }

    #[test]
    fn colored_render_wraps_whole_delta_text() {
        colored::control::set_override(true);

        let diff = replacement_diff();
        let rendered = render_chunk(&diff.chunks[0], true);
        assert_eq!(
            rendered,
            "A\n\u{1b}[91mB\n\u{1b}[0m\u{1b}[92mX\n\u{1b}[0mC\n"
        );
    }

    #[test]
    fn empty_diff_renders_nothing() {
        let diff = Diff {
            older: PathBuf::from("a"),
            newer: PathBuf::from("b"),
            chunks: vec![],
        };
        assert_eq!(render_diff(&diff, false), "");
    }
}
