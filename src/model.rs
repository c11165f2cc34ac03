//! The renderer-agnostic diff data model.
//!
//! Everything a renderer needs is here: [`Line`]s grouped into [`Hunk`]s,
//! aggregate [`Stats`], and the [`DiffResult`] that ties them together.
//! Values are built once per comparison and never mutated afterwards.

use error_set::error_set;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

error_set! {
    /// Errors from selecting a diff algorithm by name
    AlgorithmError := {
        /// The selector is neither `lcs` nor `opcode`
        #[display("Unknown diff algorithm '{name}': expected 'lcs' or 'opcode'")]
        UnknownAlgorithm { name: String },
    }
}

/// The role a line plays in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Present in both sequences
    Unchanged,
    /// Present only in the new sequence
    Inserted,
    /// Present only in the old sequence
    Deleted,
    /// Reserved for callers that pair deletions with insertions; never
    /// produced by the diff algorithms
    Modified,
}

impl LineKind {
    /// Whether a line of this kind occupies a line of the old sequence
    pub fn on_old_side(self) -> bool {
        matches!(self, LineKind::Unchanged | LineKind::Deleted)
    }

    /// Whether a line of this kind occupies a line of the new sequence
    pub fn on_new_side(self) -> bool {
        matches!(self, LineKind::Unchanged | LineKind::Inserted)
    }

    /// Unified-diff prefix character
    pub fn prefix(self) -> char {
        match self {
            LineKind::Unchanged => ' ',
            LineKind::Inserted => '+',
            LineKind::Deleted => '-',
            LineKind::Modified => '!',
        }
    }
}

/// A single line of a diff.
///
/// `old_line_number` is set iff the line is on the old side (unchanged or
/// deleted), `new_line_number` iff it is on the new side (unchanged or
/// inserted). Line numbers are 1-based.
///
/// Fields are public for reading and pattern matching. Build lines with
/// [`Line::unchanged`], [`Line::inserted`], [`Line::deleted`] or
/// [`Line::modified`]; a literal can set numbers that do not match the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Zero-based ordinal of this line within the result's line stream
    pub position: usize,
    pub kind: LineKind,
    /// Line text without its terminator
    pub content: String,
    pub old_line_number: Option<u32>,
    pub new_line_number: Option<u32>,
}

impl Line {
    pub fn unchanged(position: usize, content: impl Into<String>, old: u32, new: u32) -> Self {
        Line {
            position,
            kind: LineKind::Unchanged,
            content: content.into(),
            old_line_number: Some(old),
            new_line_number: Some(new),
        }
    }

    pub fn inserted(position: usize, content: impl Into<String>, new: u32) -> Self {
        Line {
            position,
            kind: LineKind::Inserted,
            content: content.into(),
            old_line_number: None,
            new_line_number: Some(new),
        }
    }

    pub fn deleted(position: usize, content: impl Into<String>, old: u32) -> Self {
        Line {
            position,
            kind: LineKind::Deleted,
            content: content.into(),
            old_line_number: Some(old),
            new_line_number: None,
        }
    }

    pub fn modified(position: usize, content: impl Into<String>) -> Self {
        Line {
            position,
            kind: LineKind::Modified,
            content: content.into(),
            old_line_number: None,
            new_line_number: None,
        }
    }

    /// Whether this line is anything other than unchanged
    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Unchanged
    }
}

/// A contiguous block of a diff.
///
/// `old_lines`/`new_lines` always equal the number of lines on the
/// respective side. A side with zero lines starts at the line *before* the
/// change point, as in git output (`@@ -0,0 +1,2 @@`).
///
/// Build hunks with [`Hunk::new`], which derives both counts from the lines.
/// The fields stay public for reading; a hand-written literal is not checked.
///
/// ```
/// use linediff::{Hunk, Line};
///
/// let hunk = Hunk::new(3, 3, vec![Line::deleted(0, "old", 3), Line::inserted(1, "new", 3)]);
/// assert_eq!((hunk.old_lines, hunk.new_lines), (1, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Build a hunk, counting each side from `lines`
    pub fn new(old_start: u32, new_start: u32, lines: Vec<Line>) -> Self {
        let old_lines = lines.iter().filter(|l| l.kind.on_old_side()).count() as u32;
        let new_lines = lines.iter().filter(|l| l.kind.on_new_side()).count() as u32;
        Hunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines,
        }
    }

    /// Count lines of the given kind
    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_lines, self.new_start, self.new_lines
        )?;

        for line in &self.lines {
            writeln!(f, "{}{}", line.kind.prefix(), line.content)?;
        }

        Ok(())
    }
}

/// Aggregate counters for a diff.
///
/// Always derived from the hunks of a result, never updated on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub inserted: usize,
    pub deleted: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub total_changes: usize,
    pub hunk_count: usize,
}

impl Stats {
    /// Tally `hunks` for a comparison whose old sequence had `total_old` lines.
    ///
    /// Unchanged lines are counted as the old lines that were neither deleted
    /// nor modified, which also covers results that carry no hunks at all or
    /// leave equal ranges out of their hunks.
    pub fn from_hunks(hunks: &[Hunk], total_old: usize) -> Self {
        let mut stats = Stats {
            hunk_count: hunks.len(),
            ..Stats::default()
        };

        for line in hunks.iter().flat_map(|h| &h.lines) {
            match line.kind {
                LineKind::Inserted => stats.inserted += 1,
                LineKind::Deleted => stats.deleted += 1,
                LineKind::Modified => stats.modified += 1,
                LineKind::Unchanged => {}
            }
        }

        stats.unchanged = total_old.saturating_sub(stats.deleted + stats.modified);
        stats.total_changes = stats.inserted + stats.deleted + stats.modified;
        stats
    }
}

/// Line-alignment strategy used by a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Dynamic-programming longest common subsequence
    Lcs,
    /// Matching-blocks opcodes
    Opcode,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Lcs => "lcs",
            Algorithm::Opcode => "opcode",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lcs" => Ok(Algorithm::Lcs),
            "opcode" => Ok(Algorithm::Opcode),
            _ => Err(AlgorithmError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// The complete outcome of comparing two line sequences.
///
/// Stats and the `identical` flag are computed from the hunks on
/// construction, so a result is always internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    label_a: String,
    label_b: String,
    hunks: Vec<Hunk>,
    stats: Stats,
    algorithm: Algorithm,
    identical: bool,
    old_len: usize,
    new_len: usize,
}

impl DiffResult {
    /// Assemble a result from already-grouped hunks.
    ///
    /// `old_len`/`new_len` are the lengths of the compared sequences.
    pub fn new(
        label_a: impl Into<String>,
        label_b: impl Into<String>,
        hunks: Vec<Hunk>,
        algorithm: Algorithm,
        old_len: usize,
        new_len: usize,
    ) -> Self {
        let stats = Stats::from_hunks(&hunks, old_len);
        DiffResult {
            label_a: label_a.into(),
            label_b: label_b.into(),
            hunks,
            identical: stats.total_changes == 0,
            stats,
            algorithm,
            old_len,
            new_len,
        }
    }

    pub fn label_a(&self) -> &str {
        &self.label_a
    }

    pub fn label_b(&self) -> &str {
        &self.label_b
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    pub fn into_hunks(self) -> Vec<Hunk> {
        self.hunks
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn identical(&self) -> bool {
        self.identical
    }

    pub fn old_len(&self) -> usize {
        self.old_len
    }

    pub fn new_len(&self) -> usize {
        self.new_len
    }

    /// Iterate every line of every hunk in order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.hunks.iter().flat_map(|h| h.lines.iter())
    }

    /// Similarity of the two inputs in `[0, 1]`: `2 * matched / (old + new)`.
    ///
    /// Two empty inputs are fully similar.
    pub fn similarity(&self) -> f64 {
        let total = self.old_len + self.new_len;
        if total == 0 {
            return 1.0;
        }
        let matched = self
            .old_len
            .saturating_sub(self.stats.deleted + self.stats.modified);
        2.0 * matched as f64 / total as f64
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {}", self.label_a)?;
        writeln!(f, "+++ {}", self.label_b)?;
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}
