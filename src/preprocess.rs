//! Line preparation ahead of comparison.
//!
//! [`normalize`] strips line terminators so lines compare by content.
//! [`LineFilter`] is the optional caller-side pass that drops blank lines and
//! whole-line comments before the engine ever sees them.
//!
//! # Examples
//!
//! ```
//! use linediff::preprocess::{normalize, split_lines, Language, LineFilter};
//!
//! let raw = split_lines("fn main() {\n    // entry\n\n}\n");
//! let lines = normalize(&raw);
//! assert_eq!(lines, vec!["fn main() {", "    // entry", "", "}"]);
//!
//! let filter = LineFilter::new().ignore_blank(true).language(Language::Cpp);
//! assert_eq!(filter.apply(&lines), vec!["fn main() {", "}"]);
//! ```

use error_set::error_set;
use std::fmt;
use std::str::FromStr;

error_set! {
    /// Errors from configuring a line filter
    FilterError := {
        /// Comment language is not in the rule table
        #[display("Unknown comment language '{name}'")]
        UnknownLanguage { name: String },
    }
}

/// Strip a single trailing line terminator (`\r\n`, `\n` or `\r`) from each line.
///
/// Leading and internal whitespace is left untouched.
pub fn normalize<S: AsRef<str>>(raw_lines: &[S]) -> Vec<String> {
    raw_lines
        .iter()
        .map(|line| strip_terminator(line.as_ref()).to_string())
        .collect()
}

/// Split text into lines, each keeping its terminator.
///
/// A final line without a terminator is still returned; an empty text has
/// no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}

/// How a whole-line comment is recognised, after leading whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRule {
    /// Line starts with the marker
    Prefix(&'static str),
    /// Line opens and closes the comment on the same line
    Enclosed(&'static str, &'static str),
}

impl CommentRule {
    fn matches(self, line: &str) -> bool {
        let line = line.trim_start();
        match self {
            CommentRule::Prefix(marker) => line.starts_with(marker),
            CommentRule::Enclosed(open, close) => {
                let line = line.trim_end();
                line.len() >= open.len() + close.len()
                    && line.starts_with(open)
                    && line.ends_with(close)
            }
        }
    }
}

const HASH_RULES: &[CommentRule] = &[CommentRule::Prefix("#")];

const PYTHON_RULES: &[CommentRule] = &[
    CommentRule::Prefix("#"),
    CommentRule::Enclosed("\"\"\"", "\"\"\""),
    CommentRule::Enclosed("'''", "'''"),
];

const C_RULES: &[CommentRule] = &[CommentRule::Prefix("//"), CommentRule::Enclosed("/*", "*/")];

const JAVA_RULES: &[CommentRule] = &[
    CommentRule::Prefix("//"),
    CommentRule::Enclosed("/*", "*/"),
    CommentRule::Prefix("*"),
];

const HTML_RULES: &[CommentRule] = &[CommentRule::Enclosed("<!--", "-->")];

const CSS_RULES: &[CommentRule] = &[CommentRule::Enclosed("/*", "*/")];

const SQL_RULES: &[CommentRule] = &[CommentRule::Prefix("--"), CommentRule::Enclosed("/*", "*/")];

/// Languages with a built-in comment rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    Java,
    C,
    Cpp,
    Html,
    Css,
    Shell,
    Sql,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::Html,
        Language::Css,
        Language::Shell,
        Language::Sql,
    ];

    /// Comment rules for this language
    pub fn comment_rules(self) -> &'static [CommentRule] {
        match self {
            Language::Python => PYTHON_RULES,
            Language::JavaScript | Language::C | Language::Cpp => C_RULES,
            Language::Java => JAVA_RULES,
            Language::Html => HTML_RULES,
            Language::Css => CSS_RULES,
            Language::Shell => HASH_RULES,
            Language::Sql => SQL_RULES,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Html => "html",
            Language::Css => "css",
            Language::Shell => "shell",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "py" => "python",
            "js" | "typescript" | "ts" | "rust" | "rs" | "go" => "javascript",
            "c++" | "cxx" => "cpp",
            "sh" | "bash" | "zsh" | "nix" => "shell",
            other => other,
        };

        Language::ALL
            .into_iter()
            .find(|lang| lang.name() == alias)
            .ok_or_else(|| FilterError::UnknownLanguage {
                name: s.to_string(),
            })
    }
}

/// Caller-side filter that drops lines the comparison should not see.
///
/// Filtering is a pure function of the line and the static rule table; the
/// diff engine never filters on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFilter {
    ignore_blank: bool,
    rules: &'static [CommentRule],
}

impl LineFilter {
    /// A filter that keeps every line
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop lines that are empty or whitespace only
    pub fn ignore_blank(mut self, ignore: bool) -> Self {
        self.ignore_blank = ignore;
        self
    }

    /// Drop whole-line comments of `language`
    pub fn language(mut self, language: Language) -> Self {
        self.rules = language.comment_rules();
        self
    }

    /// Whether this filter would drop nothing
    pub fn is_noop(&self) -> bool {
        !self.ignore_blank && self.rules.is_empty()
    }

    /// Whether `line` should be removed
    pub fn should_ignore(&self, line: &str) -> bool {
        if self.ignore_blank && line.trim().is_empty() {
            return true;
        }
        self.rules.iter().any(|rule| rule.matches(line))
    }

    /// Keep only the lines this filter does not ignore
    pub fn apply<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.as_ref())
            .filter(|line| !self.should_ignore(line))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn normalize_strips_one_terminator() {
        let raw = ["a\n", "b\r\n", "c\r", "d", "e\n\n", ""];
        assert_eq!(normalize(&raw), vec!["a", "b", "c", "d", "e\n", ""]);
    }

    #[test]
    fn normalize_keeps_whitespace() {
        let raw = ["  indented \t\n", "\ttab"];
        assert_eq!(normalize(&raw), vec!["  indented \t", "\ttab"]);
    }

    #[test]
    fn normalize_empty() {
        let raw: [&str; 0] = [];
        assert!(normalize(&raw).is_empty());
    }

    #[test]
    fn split_keeps_terminators() {
        assert_eq!(split_lines("one\ntwo\r\nthree"), vec!["one\n", "two\r\n", "three"]);
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("\n"), vec!["\n"]);
    }

    #[test]
    fn noop_filter_keeps_everything() {
        let filter = LineFilter::new();
        assert!(filter.is_noop());
        assert_eq!(filter.apply(&["", "# x", "y"]), vec!["", "# x", "y"]);
    }

    #[test]
    fn ignore_blank_lines() {
        let filter = LineFilter::new().ignore_blank(true);
        assert_eq!(filter.apply(&["a", "", "   ", "\t", "b"]), vec!["a", "b"]);
    }

    #[test]
    fn ignore_python_comments() {
        let filter = LineFilter::new().language(Language::Python);
        let lines = [
            "# heading",
            "    # indented",
            "x = 1  # trailing comment stays",
            "\"\"\"docstring\"\"\"",
            "'''other'''",
            "\"\"\"",
        ];
        assert_eq!(
            filter.apply(&lines),
            vec!["x = 1  # trailing comment stays", "\"\"\""]
        );
    }

    #[test]
    fn ignore_java_comments() {
        let filter = LineFilter::new().language(Language::Java);
        let lines = ["/** Javadoc", " * body", " */", "// note", "int x; /* inline */ int y;", "/* one */"];
        assert_eq!(filter.apply(&lines), vec!["/** Javadoc", "int x; /* inline */ int y;"]);
    }

    #[test]
    fn ignore_html_and_sql_comments() {
        let html = LineFilter::new().language(Language::Html);
        assert_eq!(html.apply(&["<!-- hi -->", "<p>"]), vec!["<p>"]);

        let sql = LineFilter::new().language(Language::Sql);
        assert_eq!(sql.apply(&["-- note", "SELECT 1;"]), vec!["SELECT 1;"]);
    }

    #[test]
    fn enclosed_rule_needs_both_markers() {
        let css = LineFilter::new().language(Language::Css);
        assert!(!css.should_ignore("/*/"));
        assert!(css.should_ignore("/**/"));
        assert!(!css.should_ignore("/* open only"));
    }

    #[test]
    fn parse_language_names() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("PY".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("bash".parse::<Language>().unwrap(), Language::Shell);
        for lang in Language::ALL {
            assert_eq!(lang.to_string().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn parse_unknown_language() {
        let result = "cobol".parse::<Language>();
        assert!(matches!(result, Err(FilterError::UnknownLanguage { .. })));
    }
}
