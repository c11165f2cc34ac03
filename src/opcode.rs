//! Matching-blocks line diff.
//!
//! [`SequenceMatcher`] finds the longest contiguous matching run, then
//! recurses on the pieces to its left and right (Ratcliff/Obershelp). The
//! resulting matching blocks are turned into [`Opcode`]s that tile both
//! sequences, and [`opcode_diff`] expands the non-equal opcodes into lines.
//!
//! Lines that occur very often in a long new sequence are treated as
//! "popular" and cannot seed a match on their own, which keeps the search
//! from anchoring on blank lines and braces. They can still extend a match
//! that was found through other lines.

use crate::model::Line;
use std::collections::HashMap;
use std::ops::Range;
use tracing::trace;

/// New sequences at least this long get popular-line pruning
const POPULAR_MIN_LEN: usize = 200;

/// What an opcode does with its ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    Equal,
    Delete,
    Insert,
    Replace,
}

/// A tagged pair of ranges, `a[a_start..a_end]` against `b[b_start..b_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    pub tag: OpTag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

impl Opcode {
    pub fn a_range(&self) -> Range<usize> {
        self.a_start..self.a_end
    }

    pub fn b_range(&self) -> Range<usize> {
        self.b_start..self.b_end
    }
}

/// A run of `len` equal lines starting at `a[a]` and `b[b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a: usize,
    pub b: usize,
    pub len: usize,
}

/// Aligns two line sequences by repeatedly taking the longest matching run.
pub struct SequenceMatcher<'a> {
    a: Vec<&'a str>,
    b: Vec<&'a str>,
    /// Positions of every non-popular line of `b`, ascending
    b2j: HashMap<&'a str, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new<A: AsRef<str>, B: AsRef<str>>(a: &'a [A], b: &'a [B]) -> Self {
        let a: Vec<&str> = a.iter().map(|line| line.as_ref()).collect();
        let b: Vec<&str> = b.iter().map(|line| line.as_ref()).collect();

        let mut b2j: HashMap<&str, Vec<usize>> = HashMap::new();
        for (j, line) in b.iter().enumerate() {
            b2j.entry(*line).or_default().push(j);
        }

        if b.len() >= POPULAR_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            b2j.retain(|_, indices| indices.len() <= threshold);
        }

        SequenceMatcher { a, b, b2j }
    }

    /// Longest matching run inside `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the run that starts earliest in `a`, then earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (mut best_a, mut best_b, mut best_len) = (alo, blo, 0);

        // run length of the match ending at b[j] for the previous a line
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(indices) = self.b2j.get(self.a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_len {
                        best_a = i + 1 - k;
                        best_b = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Grow the run over neighbouring equal lines, popular ones included.
        while best_a > alo && best_b > blo && self.a[best_a - 1] == self.b[best_b - 1] {
            best_a -= 1;
            best_b -= 1;
            best_len += 1;
        }
        while best_a + best_len < ahi
            && best_b + best_len < bhi
            && self.a[best_a + best_len] == self.b[best_b + best_len]
        {
            best_len += 1;
        }

        Match {
            a: best_a,
            b: best_b,
            len: best_len,
        }
    }

    /// Non-overlapping matching runs in ascending order, adjacent runs merged,
    /// terminated by a zero-length sentinel at `(len(a), len(b))`.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut found = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.len == 0 {
                continue;
            }
            if alo < m.a && blo < m.b {
                pending.push((alo, m.a, blo, m.b));
            }
            if m.a + m.len < ahi && m.b + m.len < bhi {
                pending.push((m.a + m.len, ahi, m.b + m.len, bhi));
            }
            found.push(m);
        }
        found.sort();

        let mut blocks: Vec<Match> = Vec::with_capacity(found.len() + 1);
        for m in found {
            match blocks.last_mut() {
                Some(last) if last.a + last.len == m.a && last.b + last.len == m.b => {
                    last.len += m.len;
                }
                _ => blocks.push(m),
            }
        }
        blocks.push(Match {
            a: self.a.len(),
            b: self.b.len(),
            len: 0,
        });
        blocks
    }

    /// Opcodes that tile `a` and `b` contiguously from start to end
    pub fn opcodes(&self) -> Vec<Opcode> {
        let (mut i, mut j) = (0, 0);
        let mut opcodes = Vec::new();

        for block in self.matching_blocks() {
            let tag = match (i < block.a, j < block.b) {
                (true, true) => Some(OpTag::Replace),
                (true, false) => Some(OpTag::Delete),
                (false, true) => Some(OpTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                opcodes.push(Opcode {
                    tag,
                    a_start: i,
                    a_end: block.a,
                    b_start: j,
                    b_end: block.b,
                });
            }

            i = block.a + block.len;
            j = block.b + block.len;
            if block.len > 0 {
                opcodes.push(Opcode {
                    tag: OpTag::Equal,
                    a_start: block.a,
                    a_end: i,
                    b_start: block.b,
                    b_end: j,
                });
            }
        }

        opcodes
    }

    /// Similarity in `[0, 1]`: twice the matched lines over the total lines
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|m| m.len).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Diff `a` against `b`, listing only the changed lines.
///
/// A replace lists its deletions before its insertions. Equal ranges produce
/// no lines, so unchanged lines never appear in the output.
pub fn opcode_diff<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> Vec<Line> {
    let matcher = SequenceMatcher::new(a, b);
    let opcodes = matcher.opcodes();
    trace!(
        old = a.len(),
        new = b.len(),
        opcodes = opcodes.len(),
        "computed opcodes"
    );

    let mut lines = Vec::new();
    for op in opcodes {
        if matches!(op.tag, OpTag::Delete | OpTag::Replace) {
            for i in op.a_range() {
                lines.push(Line::deleted(lines.len(), a[i].as_ref(), i as u32 + 1));
            }
        }
        if matches!(op.tag, OpTag::Insert | OpTag::Replace) {
            for j in op.b_range() {
                lines.push(Line::inserted(lines.len(), b[j].as_ref(), j as u32 + 1));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineKind;
    use similar_asserts::assert_eq;

    fn op(tag: OpTag, a: Range<usize>, b: Range<usize>) -> Opcode {
        Opcode {
            tag,
            a_start: a.start,
            a_end: a.end,
            b_start: b.start,
            b_end: b.end,
        }
    }

    #[test]
    fn opcodes_for_single_replacement() {
        let a = ["a", "b", "c"];
        let b = ["a", "x", "c"];
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(
            matcher.opcodes(),
            vec![
                op(OpTag::Equal, 0..1, 0..1),
                op(OpTag::Replace, 1..2, 1..2),
                op(OpTag::Equal, 2..3, 2..3),
            ]
        );
    }

    #[test]
    fn opcodes_for_insert_and_delete() {
        let a = ["q", "a", "b", "c", "d"];
        let b = ["a", "b", "x", "c", "d"];
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(
            matcher.opcodes(),
            vec![
                op(OpTag::Delete, 0..1, 0..0),
                op(OpTag::Equal, 1..3, 0..2),
                op(OpTag::Insert, 3..3, 2..3),
                op(OpTag::Equal, 3..5, 3..5),
            ]
        );
    }

    #[test]
    fn longest_match_prefers_earliest() {
        let a = ["x", "y", "z", "x", "y"];
        let b = ["x", "y"];
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(matcher.find_longest_match(0, 5, 0, 2), Match { a: 0, b: 0, len: 2 });
    }

    #[test]
    fn matching_blocks_end_with_sentinel() {
        let a = ["a", "b"];
        let b = ["a", "b"];
        let matcher = SequenceMatcher::new(&a, &b);
        assert_eq!(
            matcher.matching_blocks(),
            vec![Match { a: 0, b: 0, len: 2 }, Match { a: 2, b: 2, len: 0 }]
        );
    }

    #[test]
    fn empty_sequences() {
        let empty: [&str; 0] = [];
        let matcher = SequenceMatcher::new(&empty, &empty);
        assert!(matcher.opcodes().is_empty());
        assert_eq!(matcher.ratio(), 1.0);

        let lines = opcode_diff(&empty, &["n"]);
        assert_eq!(lines, vec![Line::inserted(0, "n", 1)]);

        let lines = opcode_diff(&["o"], &empty);
        assert_eq!(lines, vec![Line::deleted(0, "o", 1)]);
    }

    #[test]
    fn diff_lists_replace_as_deletes_then_inserts() {
        let lines = opcode_diff(&["a", "b", "c"], &["a", "x", "y", "c"]);
        assert_eq!(
            lines,
            vec![
                Line::deleted(0, "b", 2),
                Line::inserted(1, "x", 2),
                Line::inserted(2, "y", 3),
            ]
        );
    }

    #[test]
    fn diff_of_identical_is_empty() {
        assert!(opcode_diff(&["same", "same"], &["same", "same"]).is_empty());
    }

    #[test]
    fn ratio_counts_matched_lines() {
        let a = ["a", "b", "c", "d"];
        let b = ["a", "x", "c", "d"];
        let matcher = SequenceMatcher::new(&a, &b);
        assert!((matcher.ratio() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn popular_lines_do_not_seed_matches() {
        // 300 blank lines make "" popular in b; the unique line still anchors.
        let mut b: Vec<String> = vec![String::new(); 300];
        b.push("anchor".to_string());
        let a = vec!["anchor".to_string(), String::new()];
        let matcher = SequenceMatcher::new(&a, &b);
        assert!(!matcher.b2j.contains_key(""));
        let m = matcher.find_longest_match(0, a.len(), 0, b.len());
        assert_eq!(m, Match { a: 0, b: 300, len: 1 });
    }

    #[test]
    fn popular_lines_extend_a_match() {
        let mut b: Vec<String> = vec!["{".to_string(); 250];
        b.extend(["fn main()".to_string(), "{".to_string()]);
        let a = vec!["fn main()".to_string(), "{".to_string()];
        let matcher = SequenceMatcher::new(&a, &b);
        let m = matcher.find_longest_match(0, a.len(), 0, b.len());
        assert_eq!(m, Match { a: 0, b: 250, len: 2 });
    }

    #[test]
    fn opcodes_tile_both_sequences() {
        let a = ["1", "2", "3", "4", "5", "6"];
        let b = ["0", "2", "3", "x", "5", "7", "8"];
        let ops = SequenceMatcher::new(&a, &b).opcodes();
        let (mut i, mut j) = (0, 0);
        for op in &ops {
            assert_eq!((op.a_start, op.b_start), (i, j));
            i = op.a_end;
            j = op.b_end;
        }
        assert_eq!((i, j), (a.len(), b.len()));
        assert!(ops.iter().any(|o| o.tag == OpTag::Replace));
        let kinds: Vec<LineKind> = opcode_diff(&a, &b).iter().map(|l| l.kind).collect();
        assert!(!kinds.contains(&LineKind::Unchanged));
    }
}
