use git2::{DiffOptions, Patch};
use linediff::preprocess::{normalize, split_lines};
use linediff::{Algorithm, LineKind, compare, parse_unified_text};
use similar_asserts::assert_eq;
use std::path::Path;

/// Render a patch between two texts with libgit2
fn git_patch(old: &str, new: &str, context: u32) -> (String, (usize, usize, usize), usize) {
    let mut opts = DiffOptions::new();
    opts.context_lines(context);

    let mut patch = Patch::from_buffers(
        old.as_bytes(),
        Some(Path::new("file.txt")),
        new.as_bytes(),
        Some(Path::new("file.txt")),
        Some(&mut opts),
    )
    .unwrap();

    let text = patch.to_buf().unwrap().as_str().unwrap().to_string();
    (text, patch.line_stats().unwrap(), patch.num_hunks())
}

fn lines(text: &str) -> Vec<String> {
    normalize(&split_lines(text))
}

const OLD: &str = "fn main() {\n    let x = 1;\n    println!(\"{x}\");\n}\n\nfn helper() {}\n";
const NEW: &str =
    "fn main() {\n    let x = 2;\n    println!(\"{x}\");\n    helper();\n}\n\nfn helper() {}\n// end\n";

#[test]
fn parses_git_zero_context_patch() {
    let (text, (_, additions, deletions), hunk_count) = git_patch(OLD, NEW, 0);
    let hunks = parse_unified_text(&text).unwrap();

    assert_eq!(hunks.len(), hunk_count);
    let inserted: usize = hunks.iter().map(|h| h.count(LineKind::Inserted)).sum();
    let deleted: usize = hunks.iter().map(|h| h.count(LineKind::Deleted)).sum();
    assert_eq!((inserted, deleted), (additions, deletions));
}

#[test]
fn parsed_git_line_numbers_point_at_source_lines() {
    let old = lines(OLD);
    let new = lines(NEW);

    for context in [0, 1, 3] {
        let (text, (context_lines, _, _), _) = git_patch(OLD, NEW, context);
        let hunks = parse_unified_text(&text).unwrap();

        let mut unchanged = 0;
        for line in hunks.iter().flat_map(|h| &h.lines) {
            if let Some(n) = line.old_line_number {
                assert_eq!(old[n as usize - 1], line.content);
            }
            if let Some(n) = line.new_line_number {
                assert_eq!(new[n as usize - 1], line.content);
            }
            if line.kind == LineKind::Unchanged {
                unchanged += 1;
            }
        }
        assert_eq!(unchanged, context_lines);
    }
}

#[test]
fn lcs_counts_match_git_on_unambiguous_edit() {
    let old = "alpha\nbeta\ngamma\ndelta\n";
    let new = "alpha\nBETA\ngamma\ndelta\nepsilon\n";

    let (_, (_, additions, deletions), _) = git_patch(old, new, 0);
    let result = compare(&lines(old), &lines(new), Algorithm::Lcs);

    assert_eq!(result.stats().inserted, additions);
    assert_eq!(result.stats().deleted, deletions);
}

#[test]
fn opcode_hunks_match_git_zero_context_headers() {
    let old = "one\ntwo\nthree\nfour\nfive\n";
    let new = "one\nTWO\nthree\nfour\nfive\nsix\n";

    let (text, _, _) = git_patch(old, new, 0);
    let from_git = parse_unified_text(&text).unwrap();
    let ours = compare(&lines(old), &lines(new), Algorithm::Opcode);

    let headers = |hunks: &[linediff::Hunk]| {
        hunks
            .iter()
            .map(|h| (h.old_start, h.old_lines, h.new_start, h.new_lines))
            .collect::<Vec<_>>()
    };
    assert_eq!(headers(ours.hunks()), headers(from_git.as_slice()));
}
