//! Line-level text model shared by the registry patchers.
//!
//! A registry file is held as a [`Document`]: its lines plus whether it ended
//! with a newline. Patchers locate a sorted region (a contiguous run of lines),
//! compute an [`InsertionPoint`] for the new line, and insert it. Only the
//! dispatch table ever reorders existing lines, and only inside its block.

use serde::Serialize;
use std::cmp::Ordering;
use std::ops::Range;

/// Which registry file a patch applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryRole {
    ModuleIndex,
    TestRegistration,
    DispatchTable,
}

impl std::fmt::Display for RegistryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModuleIndex => write!(f, "module index"),
            Self::TestRegistration => write!(f, "test registration"),
            Self::DispatchTable => write!(f, "dispatch table"),
        }
    }
}

/// How the existing lines of a region are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Sorted by full (trimmed) line text.
    Text,
    /// Not sorted by text, but sorted by the region's declared key.
    Key,
    /// Hand-ordered; new lines go at the end.
    Unordered,
}

/// Where a new line lands and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionPoint {
    pub role: RegistryRole,
    /// Human-readable name of the region, e.g. `module declarations`.
    pub region: String,
    /// Zero-based line index of the new line in the patched file.
    pub line_index: usize,
    /// The inserted line, including indentation.
    pub text: String,
    /// Key the line was ordered by.
    pub key: String,
    /// Ordering detected in the region before insertion.
    pub order: SortOrder,
}

/// Result of a successful patch.
#[derive(Debug, Clone)]
pub struct Patched {
    pub content: String,
    pub insertions: Vec<InsertionPoint>,
}

/// A text file split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    trailing_newline: bool,
    crlf: bool,
}

impl Document {
    pub fn parse(content: &str) -> Self {
        let trailing_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines: Vec<String> = if content.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(str::to_string).collect()
        };
        let crlf = lines.first().is_some_and(|l| l.ends_with('\r'));
        Self {
            lines,
            trailing_newline,
            crlf,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Insert `line` (without line terminator) before index `at`.
    pub fn insert(&mut self, at: usize, line: &str) {
        let mut line = line.to_string();
        if self.crlf {
            line.push('\r');
        }
        self.lines.insert(at, line);
    }

    /// Stable sort of the lines in `range` by `key`.
    pub fn sort_range(&mut self, range: Range<usize>, key: impl Fn(&str) -> String) {
        self.lines[range].sort_by_cached_key(|line| key(line));
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }
}

/// Leading whitespace of a line.
pub fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// A line with no content other than whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Maximal runs of consecutive indices in `range` satisfying `pred`.
pub fn runs(range: Range<usize>, mut pred: impl FnMut(usize) -> bool) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut start = None;
    for i in range.clone() {
        match (pred(i), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                found.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        found.push(s..range.end);
    }
    found
}

fn is_sorted_by(lines: &[&str], cmp: impl Fn(&str, &str) -> Ordering) -> bool {
    lines
        .windows(2)
        .all(|pair| cmp(pair[0], pair[1]) != Ordering::Greater)
}

/// Offset within `existing` at which `new_line` keeps the region ordered.
///
/// Text order wins when the region already sorts by text. Otherwise the
/// declared `key` is used if the region sorts by it. A region that follows
/// neither gets the new line appended. Ties go after existing equal lines,
/// matching a stable sort with the new line appended last.
pub fn insertion_offset(
    existing: &[&str],
    new_line: &str,
    key: impl Fn(&str) -> String,
) -> (usize, SortOrder) {
    let text_cmp = |a: &str, b: &str| a.trim().cmp(b.trim());
    if is_sorted_by(existing, text_cmp) {
        let at = existing.partition_point(|l| text_cmp(*l, new_line) != Ordering::Greater);
        return (at, SortOrder::Text);
    }

    let key_cmp = |a: &str, b: &str| key(a).cmp(&key(b));
    if is_sorted_by(existing, key_cmp) {
        let at = existing.partition_point(|l| key_cmp(*l, new_line) != Ordering::Greater);
        return (at, SortOrder::Key);
    }

    (existing.len(), SortOrder::Unordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_preserves_trailing_newline_state() {
        for content in ["a\nb\n", "a\nb", "", "\n", "a\n\n"] {
            assert_eq!(Document::parse(content).render(), content, "{content:?}");
        }
    }

    #[test]
    fn test_document_sort_range_is_stable() {
        let mut doc = Document::parse("head\n  b\nb\na\ntail\n");
        doc.sort_range(1..4, |line| line.trim().to_string());
        assert_eq!(doc.render(), "head\na\n  b\nb\ntail\n");
    }

    #[test]
    fn test_document_insert_follows_crlf() {
        let mut doc = Document::parse("mod a;\r\nmod c;\r\n");
        doc.insert(1, "mod b;");
        assert_eq!(doc.render(), "mod a;\r\nmod b;\r\nmod c;\r\n");
    }

    #[test]
    fn test_indentation() {
        assert_eq!(indentation("    #[test_case(x)]"), "    ");
        assert_eq!(indentation("mod a;"), "");
        assert_eq!(indentation("\t\tx"), "\t\t");
    }

    #[test]
    fn test_runs() {
        let flags = [true, true, false, true, false, false, true];
        let found = runs(0..flags.len(), |i| flags[i]);
        assert_eq!(found, vec![0..2, 3..4, 6..7]);
        assert!(runs(0..0, |_| true).is_empty());
    }

    #[test]
    fn test_insertion_offset_text_order() {
        let existing = ["mod a;", "mod c;"];
        let (at, order) = insertion_offset(&existing, "mod b;", |l| l.to_string());
        assert_eq!((at, order), (1, SortOrder::Text));

        let (at, _) = insertion_offset(&existing, "mod d;", |l| l.to_string());
        assert_eq!(at, 2);
        let (at, _) = insertion_offset(&existing, "mod 0;", |l| l.to_string());
        assert_eq!(at, 0);
    }

    #[test]
    fn test_insertion_offset_falls_back_to_key() {
        // Sorted by module name but not by text because of mixed visibility.
        let existing = [
            "pub(crate) mod alpha;",
            "pub mod beta;",
            "pub(crate) mod gamma;",
        ];
        let key = |l: &str| l.rsplit(' ').next().unwrap_or(l).to_string();
        let (at, order) = insertion_offset(&existing, "pub(crate) mod delta;", key);
        assert_eq!((at, order), (2, SortOrder::Key));
    }

    #[test]
    fn test_insertion_offset_unordered_appends() {
        let existing = ["mod zeta;", "mod alpha;", "mod mid;"];
        let (at, order) = insertion_offset(&existing, "mod beta;", |l| l.to_string());
        assert_eq!((at, order), (3, SortOrder::Unordered));
    }

    #[test]
    fn test_insertion_offset_ignores_indentation() {
        let existing = ["    b", "    d"];
        let (at, _) = insertion_offset(&existing, "  c", |l| l.to_string());
        assert_eq!(at, 1);
    }

    #[test]
    fn test_insertion_offset_empty_region() {
        let (at, order) = insertion_offset(&[], "mod a;", |l| l.to_string());
        assert_eq!((at, order), (0, SortOrder::Text));
    }
}
