//! Grouping of a flat change list into hunks.
//!
//! Hunks use zero context: a boundary falls exactly where the change list
//! skips lines of the inputs. An LCS change list names every line, so a
//! changed LCS result is a single whole-file hunk; the opcode list leaves out
//! equal ranges, so each edit region becomes its own hunk. A list with no
//! changes produces no hunks.
//!
//! Skipped ranges are always unchanged lines, so they have the same length on
//! both sides and both cursors advance together across a gap.

use crate::model::{Hunk, Line, LineKind, Stats};

/// Next expected 1-based line number on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    old: u32,
    new: u32,
}

impl Cursor {
    /// How many lines the stream skipped before `line`
    fn gap_before(self, line: &Line) -> u32 {
        match line.kind {
            LineKind::Unchanged | LineKind::Deleted => line
                .old_line_number
                .map_or(0, |n| n.saturating_sub(self.old)),
            LineKind::Inserted => line
                .new_line_number
                .map_or(0, |n| n.saturating_sub(self.new)),
            LineKind::Modified => 0,
        }
    }

    fn skip(&mut self, lines: u32) {
        self.old += lines;
        self.new += lines;
    }

    fn advance_past(&mut self, line: &Line) {
        if line.kind.on_old_side() {
            self.old += 1;
        }
        if line.kind.on_new_side() {
            self.new += 1;
        }
    }
}

/// A hunk being collected, remembering where it opened
struct OpenHunk {
    at: Cursor,
    lines: Vec<Line>,
}

impl OpenHunk {
    fn close(self) -> Hunk {
        let mut hunk = Hunk::new(self.at.old, self.at.new, self.lines);
        // An empty side points at the line before the change, like git does.
        if hunk.old_lines == 0 {
            hunk.old_start = hunk.old_start.saturating_sub(1);
        }
        if hunk.new_lines == 0 {
            hunk.new_start = hunk.new_start.saturating_sub(1);
        }
        hunk
    }
}

/// Group `changes` into hunks and derive the stats.
///
/// `total_old`/`total_new` are the lengths of the compared sequences.
/// Lines keep their positions; hunks come out in ascending `old_start`.
pub fn assemble(changes: Vec<Line>, total_old: usize, total_new: usize) -> (Vec<Hunk>, Stats) {
    let hunks = if changes.iter().any(Line::is_change) {
        group(changes)
    } else {
        Vec::new()
    };

    let stats = Stats::from_hunks(&hunks, total_old);
    debug_assert_eq!(
        stats.unchanged,
        total_new.saturating_sub(stats.inserted + stats.modified),
        "unchanged lines must balance on both sides"
    );
    (hunks, stats)
}

fn group(changes: Vec<Line>) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut cursor = Cursor { old: 1, new: 1 };
    let mut current: Option<OpenHunk> = None;

    for line in changes {
        let gap = cursor.gap_before(&line);
        if gap > 0 {
            if let Some(open) = current.take() {
                hunks.push(open.close());
            }
            cursor.skip(gap);
        }

        let open = current.get_or_insert_with(|| OpenHunk {
            at: cursor,
            lines: Vec::new(),
        });
        cursor.advance_past(&line);
        open.lines.push(line);
    }

    if let Some(open) = current {
        hunks.push(open.close());
    }
    hunks
}
