//! Line-level text diffing.
//!
//! Compare two sequences of lines with either the LCS or the opcode
//! strategy and get back a [`DiffResult`]: hunks of inserted, deleted and
//! unchanged lines plus aggregate [`Stats`]. The [`unified`] module encodes
//! results as unified-diff text and decodes such text back into hunks.
//!
//! ```
//! use linediff::{compare, Algorithm};
//!
//! let result = compare(&["a", "b", "c"], &["a", "x", "c"], Algorithm::Lcs);
//! assert!(!result.identical());
//! assert_eq!(result.stats().inserted, 1);
//! assert_eq!(result.stats().deleted, 1);
//! ```

use error_set::error_set;
use tracing::debug;

pub mod assemble;
pub mod lcs;
pub mod model;
pub mod opcode;
pub mod preprocess;
pub mod unified;

pub use model::{Algorithm, AlgorithmError, DiffResult, Hunk, Line, LineKind, Stats};
pub use preprocess::FilterError;
pub use unified::{ParseError, parse_unified, parse_unified_text, to_unified};

error_set! {
    /// Top-level error for linediff operations
    LineDiffError := {
        ParseError(ParseError),
        AlgorithmError(AlgorithmError),
        FilterError(FilterError),
    }
}

/// Compare two line sequences with the given algorithm.
///
/// Lines are compared exactly; run them through
/// [`preprocess::normalize`] first if they still carry terminators. The
/// result is labelled `a` and `b`; use [`Differ`] for other labels.
pub fn compare<A, B>(a: &[A], b: &[B], algorithm: Algorithm) -> DiffResult
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    Differ::new(algorithm).compare(a, b)
}

/// Reusable comparison settings: the algorithm and the labels of both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Differ<'a> {
    algorithm: Algorithm,
    label_a: &'a str,
    label_b: &'a str,
}

impl<'a> Differ<'a> {
    /// Create a differ for `algorithm` with labels `a` and `b`
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            label_a: "a",
            label_b: "b",
        }
    }

    /// Create a differ from an algorithm name (`lcs` or `opcode`).
    ///
    /// # Examples
    /// ```
    /// # use linediff::{Differ, AlgorithmError};
    /// assert!(Differ::with_algorithm_name("opcode").is_ok());
    /// assert!(matches!(
    ///     Differ::with_algorithm_name("myers"),
    ///     Err(AlgorithmError::UnknownAlgorithm { .. })
    /// ));
    /// ```
    pub fn with_algorithm_name(name: &str) -> Result<Self, AlgorithmError> {
        Ok(Self::new(name.parse()?))
    }

    /// Set the labels written to the `---`/`+++` headers
    pub fn labels(mut self, label_a: &'a str, label_b: &'a str) -> Self {
        self.label_a = label_a;
        self.label_b = label_b;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Compare `a` against `b`.
    ///
    /// The same inputs always give the same result.
    ///
    /// # Examples
    /// ```
    /// # use linediff::{Algorithm, Differ};
    /// let differ = Differ::new(Algorithm::Opcode).labels("old.txt", "new.txt");
    /// let result = differ.compare(&["x"], &["x", "y"]);
    /// assert_eq!(
    ///     linediff::to_unified(&result),
    ///     "--- old.txt\n+++ new.txt\n@@ -1,0 +2,1 @@\n+y\n"
    /// );
    /// ```
    pub fn compare<A, B>(&self, a: &[A], b: &[B]) -> DiffResult
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let changes = match self.algorithm {
            Algorithm::Lcs => lcs::lcs_diff(a, b),
            Algorithm::Opcode => opcode::opcode_diff(a, b),
        };
        let (hunks, stats) = assemble::assemble(changes, a.len(), b.len());
        debug!(
            algorithm = %self.algorithm,
            old = a.len(),
            new = b.len(),
            hunks = stats.hunk_count,
            changes = stats.total_changes,
            "compared line sequences"
        );

        DiffResult::new(
            self.label_a,
            self.label_b,
            hunks,
            self.algorithm,
            a.len(),
            b.len(),
        )
    }
}
