//! Unified-diff text codec.
//!
//! Decodes `---`/`+++`/`@@ -a,b +c,d @@` text back into [`Hunk`]s and
//! encodes a [`DiffResult`] into the same format.
//!
//! # Examples
//!
//! ```
//! use linediff::unified::parse_unified_text;
//! use linediff::LineKind;
//!
//! let hunks = parse_unified_text("--- a\n+++ b\n@@ -1 +1,2 @@\n-old\n+new1\n+new2\n").unwrap();
//! assert_eq!(hunks.len(), 1);
//! assert_eq!((hunks[0].old_lines, hunks[0].new_lines), (1, 2));
//! assert_eq!(hunks[0].lines[2].kind, LineKind::Inserted);
//! assert_eq!(hunks[0].lines[2].new_line_number, Some(2));
//! ```
//!
//! # Decoding rules
//!
//! - A hunk stays open until the old and new line counts its header declares
//!   have been consumed. Only outside an open hunk are `---`/`+++` lines file
//!   headers, so a deleted `-- note` line (`--- note`) is read as content.
//! - A header without `,<len>` declares a length of 1.
//! - Body lines: `-` deleted, `+` inserted, `!` modified, anything else
//!   unchanged (a leading space is stripped). `\ No newline at end of file`
//!   markers are skipped. `!` lines right after a complete hunk still
//!   belong to it.
//! - A header whose last old or new line number would not fit a `u32` is
//!   malformed.
//! - Text between hunks that is not a header (`diff --git`, `index ...`) is
//!   ignored.

use crate::model::{DiffResult, Hunk, Line};
use error_set::error_set;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as decimal},
    combinator::opt,
    sequence::preceded,
};
use std::fmt;
use tracing::debug;

error_set! {
    /// Errors from decoding unified-diff text
    ParseError := {
        /// An `@@` line whose ranges do not parse
        #[display("Malformed hunk header on line {line_number}: '{line}'")]
        MalformedHeader { line_number: usize, line: String },
        /// Input ended or a new hunk began before a hunk's declared lines
        #[display("Hunk '{header}' does not match its body at line {line_number}")]
        HunkBodyMismatch { line_number: usize, header: String },
    }
}

/// Parsed `@@ -old_start[,old_lines] +new_start[,new_lines] @@`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_start: u32,
    old_lines: u32,
    new_start: u32,
    new_lines: u32,
}

/// `<start>[,<len>]`, a missing length meaning 1
fn range(input: &str) -> IResult<&str, (u32, u32)> {
    (decimal, opt(preceded(char(','), decimal)))
        .map(|(start, len)| (start, len.unwrap_or(1)))
        .parse(input)
}

fn hunk_header(input: &str) -> IResult<&str, HunkHeader> {
    (tag("@@ -"), range, tag(" +"), range, tag(" @@"))
        .map(|(_, (old_start, old_lines), _, (new_start, new_lines), _)| HunkHeader {
            old_start,
            old_lines,
            new_start,
            new_lines,
        })
        .parse(input)
}

/// Number of the last line of a `start`/`len` range, if it fits
fn last_line(start: u32, len: u32) -> Option<u32> {
    start.checked_add(len.saturating_sub(1))
}

/// A hunk whose body is still being read
struct OpenHunk {
    header: HunkHeader,
    header_text: String,
    lines: Vec<Line>,
    old_seen: u32,
    new_seen: u32,
}

impl OpenHunk {
    fn start(line: &str, line_number: usize) -> Result<Self, ParseError> {
        let malformed = || ParseError::MalformedHeader {
            line_number,
            line: line.to_string(),
        };
        let (_, header) = hunk_header(line).map_err(|_| malformed())?;
        // The last line of each side must still have a number.
        if last_line(header.old_start, header.old_lines).is_none()
            || last_line(header.new_start, header.new_lines).is_none()
        {
            return Err(malformed());
        }

        Ok(OpenHunk {
            header,
            header_text: line.to_string(),
            lines: Vec::new(),
            old_seen: 0,
            new_seen: 0,
        })
    }

    fn is_complete(&self) -> bool {
        self.old_seen == self.header.old_lines && self.new_seen == self.header.new_lines
    }

    fn mismatch(&self, line_number: usize) -> ParseError {
        ParseError::HunkBodyMismatch {
            line_number,
            header: self.header_text.clone(),
        }
    }

    /// Consume one body line, numbering it from the header's starts
    fn push_body(
        &mut self,
        line: &str,
        position: &mut usize,
        line_number: usize,
    ) -> Result<(), ParseError> {
        if line.starts_with('\\') {
            return Ok(());
        }
        if line.starts_with("@@") {
            return Err(self.mismatch(line_number));
        }

        // Only set while that side still has declared lines left, which
        // `start` has checked fit in a u32.
        let old_number = (self.old_seen < self.header.old_lines)
            .then(|| self.header.old_start + self.old_seen);
        let new_number = (self.new_seen < self.header.new_lines)
            .then(|| self.header.new_start + self.new_seen);

        let parsed = if let Some(content) = line.strip_prefix('-') {
            let old = old_number.ok_or_else(|| self.mismatch(line_number))?;
            self.old_seen += 1;
            Line::deleted(*position, content, old)
        } else if let Some(content) = line.strip_prefix('+') {
            let new = new_number.ok_or_else(|| self.mismatch(line_number))?;
            self.new_seen += 1;
            Line::inserted(*position, content, new)
        } else if let Some(content) = line.strip_prefix('!') {
            Line::modified(*position, content)
        } else {
            let (Some(old), Some(new)) = (old_number, new_number) else {
                return Err(self.mismatch(line_number));
            };
            self.old_seen += 1;
            self.new_seen += 1;
            let content = line.strip_prefix(' ').unwrap_or(line);
            Line::unchanged(*position, content, old, new)
        };

        *position += 1;
        self.lines.push(parsed);
        Ok(())
    }

    fn finish(self) -> Hunk {
        Hunk {
            old_start: self.header.old_start,
            old_lines: self.header.old_lines,
            new_start: self.header.new_start,
            new_lines: self.header.new_lines,
            lines: self.lines,
        }
    }
}

/// A decoded unified diff for one pair of inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedDiff {
    /// Label from the first `---` header, without any timestamp
    pub old_label: Option<String>,
    /// Label from the first `+++` header, without any timestamp
    pub new_label: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl UnifiedDiff {
    /// Decode unified-diff lines (without terminators).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedHeader`] for an `@@` line whose ranges
    /// do not parse, and [`ParseError::HunkBodyMismatch`] when a hunk body
    /// has fewer or different lines than its header declares.
    pub fn parse<'a, I>(lines: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut old_label = None;
        let mut new_label = None;
        let mut hunks = Vec::new();
        let mut current: Option<OpenHunk> = None;
        let mut position = 0;
        let mut line_count = 0;

        for (index, line) in lines.into_iter().enumerate() {
            let line_number = index + 1;
            line_count = line_number;

            // Modified lines take no side, so they can follow a hunk whose
            // counts are already used up.
            match current.as_mut() {
                Some(open) if !open.is_complete() || line.starts_with('!') => {
                    open.push_body(line, &mut position, line_number)?;
                    continue;
                }
                _ => {}
            }

            if line.starts_with("@@") {
                if let Some(done) = current.take() {
                    hunks.push(done.finish());
                }
                current = Some(OpenHunk::start(line, line_number)?);
            } else if let Some(label) = line.strip_prefix("--- ") {
                old_label.get_or_insert_with(|| header_label(label));
            } else if let Some(label) = line.strip_prefix("+++ ") {
                new_label.get_or_insert_with(|| header_label(label));
            }
        }

        if let Some(open) = current {
            if !open.is_complete() {
                return Err(open.mismatch(line_count + 1));
            }
            hunks.push(open.finish());
        }

        debug!(hunks = hunks.len(), lines = line_count, "parsed unified diff");
        Ok(UnifiedDiff {
            old_label,
            new_label,
            hunks,
        })
    }
}

impl fmt::Display for UnifiedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.old_label {
            writeln!(f, "--- {}", label)?;
        }
        if let Some(label) = &self.new_label {
            writeln!(f, "+++ {}", label)?;
        }
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}

/// Header label up to an optional tab-separated timestamp
fn header_label(text: &str) -> String {
    text.split('\t').next().unwrap_or(text).to_string()
}

/// Decode unified-diff lines into hunks.
///
/// See [`UnifiedDiff::parse`] for the errors.
pub fn parse_unified<'a, I>(lines: I) -> Result<Vec<Hunk>, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    Ok(UnifiedDiff::parse(lines)?.hunks)
}

/// Decode a whole unified-diff text into hunks.
///
/// Lines end at `\n` only; a `\r` before it stays part of the content.
pub fn parse_unified_text(text: &str) -> Result<Vec<Hunk>, ParseError> {
    parse_unified(
        text.split_inclusive('\n')
            .map(|line| line.strip_suffix('\n').unwrap_or(line)),
    )
}

/// Encode a result as unified-diff text.
///
/// Headers always spell out both lengths (`@@ -1,1 +1,2 @@`).
pub fn to_unified(result: &DiffResult) -> String {
    result.to_string()
}
