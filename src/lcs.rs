//! Longest-common-subsequence line diff.
//!
//! Fills an `(m+1) x (n+1)` table where cell `(i, j)` holds the LCS length of
//! `a[..i]` and `b[..j]`, then walks back from `(m, n)`. On a tie the walk
//! prefers emitting an insertion, which decides which of several minimal
//! edit scripts comes out; results depend on that choice staying fixed.
//!
//! Time and memory are both `O(m * n)`, so callers should bound input sizes.

use crate::model::Line;
use tracing::trace;

/// Row-major DP table of LCS lengths
struct LcsTable {
    cols: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    fn build<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> Self {
        let cols = b.len() + 1;
        let mut cells = vec![0u32; (a.len() + 1) * cols];

        for i in 1..=a.len() {
            for j in 1..=b.len() {
                cells[i * cols + j] = if a[i - 1].as_ref() == b[j - 1].as_ref() {
                    cells[(i - 1) * cols + j - 1] + 1
                } else {
                    cells[(i - 1) * cols + j].max(cells[i * cols + j - 1])
                };
            }
        }

        LcsTable { cols, cells }
    }

    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.cols + j]
    }
}

/// Length of the longest common subsequence of `a` and `b`
pub fn lcs_length<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> usize {
    LcsTable::build(a, b).get(a.len(), b.len()) as usize
}

/// Diff `a` against `b`, listing every line of both in order.
///
/// Unchanged lines carry both line numbers, deletions the old one and
/// insertions the new one. Positions are the zero-based order of the output.
pub fn lcs_diff<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> Vec<Line> {
    let table = LcsTable::build(a, b);
    trace!(
        old = a.len(),
        new = b.len(),
        lcs = table.get(a.len(), b.len()),
        "built LCS table"
    );

    // Walk back from the bottom-right corner; entries come out last-first.
    let mut reversed = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (a.len(), b.len());

    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1].as_ref() == b[j - 1].as_ref() {
            reversed.push(Line::unchanged(0, a[i - 1].as_ref(), i as u32, j as u32));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table.get(i, j - 1) >= table.get(i - 1, j)) {
            reversed.push(Line::inserted(0, b[j - 1].as_ref(), j as u32));
            j -= 1;
        } else {
            reversed.push(Line::deleted(0, a[i - 1].as_ref(), i as u32));
            i -= 1;
        }
    }

    reversed
        .into_iter()
        .rev()
        .enumerate()
        .map(|(position, line)| Line { position, ..line })
        .collect()
}
