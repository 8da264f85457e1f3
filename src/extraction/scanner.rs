//! Line scanner that finds delimited doc blocks and strips comment leaders.

use crate::core::{ExtractionError, Language};
use std::collections::BTreeSet;
use std::ops::Range;

/// Comment delimiter pair and per-line leader for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: &'static str,
    pub close: &'static str,
    pub leader: char,
}

impl Delimiters {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::TypeScript
            | Language::JavaScript
            | Language::Java
            | Language::Kotlin
            | Language::Php => Self {
                open: "/**",
                close: "*/",
                leader: '*',
            },
        }
    }
}

/// One interior line of a block after the leader has been removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteriorLine {
    /// 1-based source line
    pub line: usize,
    /// 1-based column where `text` starts in the source line
    pub column: usize,
    pub text: String,
}

impl InteriorLine {
    pub fn new(line: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A well-formed doc block found in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// 1-based line of the opening delimiter
    pub start_line: usize,
    /// 1-based line of the closing delimiter
    pub end_line: usize,
    /// Byte span from the opening to the end of the closing delimiter
    pub span: Range<usize>,
    pub lines: Vec<InteriorLine>,
}

/// An opening delimiter that never closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnclosedBlock {
    pub error: ExtractionError,
    /// Declaration line the scan ran into, `None` when it hit end-of-file
    pub stopped_at: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub blocks: Vec<RawBlock>,
    pub unclosed: Vec<UnclosedBlock>,
}

/// Source text split into lines with their byte offsets.
pub(crate) struct Lines<'a> {
    lines: Vec<&'a str>,
    starts: Vec<usize>,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut starts = Vec::new();
        let mut offset = 0;
        for raw in text.split('\n') {
            starts.push(offset);
            offset += raw.len() + 1;
            lines.push(raw.strip_suffix('\r').unwrap_or(raw));
        }
        Self { lines, starts }
    }

    /// Text of a 1-based line, empty when out of range
    pub(crate) fn get(&self, line: usize) -> &'a str {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .copied()
            .unwrap_or("")
    }

    pub(crate) fn is_blank(&self, line: usize) -> bool {
        self.get(line).trim().is_empty()
    }

    fn offset(&self, line: usize, column_idx: usize) -> usize {
        self.starts.get(line - 1).copied().unwrap_or(0) + column_idx
    }

    fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Scan `text` for doc blocks.
///
/// `stop_lines` holds every declaration line; an unclosed block stops at the
/// first one it reaches so that a single malformed block cannot swallow the
/// rest of the file.
pub fn scan_blocks(text: &str, delimiters: Delimiters, stop_lines: &BTreeSet<usize>) -> ScanResult {
    let lines = Lines::new(text);
    let mut result = ScanResult::default();
    let mut line_no = 1;

    while line_no <= lines.len() {
        let line = lines.get(line_no);
        let indent = line.len() - line.trim_start().len();
        let trimmed = &line[indent..];

        if let Some(rest) = trimmed.strip_prefix(delimiters.open) {
            // `/**/` is an empty plain comment, not a doc block
            if !rest.starts_with('/') {
                line_no = scan_one(&lines, line_no, indent, delimiters, stop_lines, &mut result);
                continue;
            }
        } else if trimmed.starts_with("/*") {
            line_no = skip_plain_comment(&lines, line_no, indent, delimiters);
            continue;
        }
        line_no += 1;
    }

    result
}

/// Scan a single block opening at `open_line`; returns the next line to scan.
fn scan_one(
    lines: &Lines<'_>,
    open_line: usize,
    indent: usize,
    delimiters: Delimiters,
    stop_lines: &BTreeSet<usize>,
    result: &mut ScanResult,
) -> usize {
    let first = lines.get(open_line);
    let after_open = indent + delimiters.open.len();
    let span_start = lines.offset(open_line, indent);

    // Single-line block: `/** Brief. */`
    if let Some(close_rel) = first[after_open..].find(delimiters.close) {
        let close_idx = after_open + close_rel;
        let inner = &first[after_open..close_idx];
        let mut interior = Vec::new();
        push_trimmed_interior(&mut interior, open_line, after_open, inner);
        result.blocks.push(RawBlock {
            start_line: open_line,
            end_line: open_line,
            span: span_start..lines.offset(open_line, close_idx + delimiters.close.len()),
            lines: interior,
        });
        return open_line + 1;
    }

    let mut interior = Vec::new();
    push_trimmed_interior(&mut interior, open_line, after_open, &first[after_open..]);

    let mut current = open_line + 1;
    while current <= lines.len() {
        if stop_lines.contains(&current) {
            result.unclosed.push(UnclosedBlock {
                error: unclosed_error(open_line, indent, Some(current)),
                stopped_at: Some(current),
            });
            return current;
        }

        let line = lines.get(current);
        if let Some(close_idx) = line.find(delimiters.close) {
            let before_close = &line[..close_idx];
            if !before_close.trim().is_empty() {
                let (offset, text) = strip_leader(before_close, delimiters.leader);
                interior.push(InteriorLine::new(current, offset + 1, text.trim_end()));
            }
            result.blocks.push(RawBlock {
                start_line: open_line,
                end_line: current,
                span: span_start..lines.offset(current, close_idx + delimiters.close.len()),
                lines: interior,
            });
            return current + 1;
        }

        let (offset, text) = strip_leader(line, delimiters.leader);
        interior.push(InteriorLine::new(current, offset + 1, text.trim_end()));
        current += 1;
    }

    result.unclosed.push(UnclosedBlock {
        error: unclosed_error(open_line, indent, None),
        stopped_at: None,
    });
    current
}

fn unclosed_error(open_line: usize, indent: usize, stopped_at: Option<usize>) -> ExtractionError {
    let message = match stopped_at {
        Some(line) => format!(
            "doc block opened here is not closed before the declaration on line {}",
            line
        ),
        None => "doc block opened here is not closed before end of file".to_string(),
    };
    ExtractionError::malformed_delimiter(open_line, indent + 1, message)
}

/// Skip a plain `/* ... */` comment so its contents are never taken for a doc block.
fn skip_plain_comment(lines: &Lines<'_>, open_line: usize, indent: usize, delimiters: Delimiters) -> usize {
    let first = lines.get(open_line);
    if first[indent + 2..].contains(delimiters.close) {
        return open_line + 1;
    }
    (open_line + 1..=lines.len())
        .find(|&n| lines.get(n).contains(delimiters.close))
        .map_or(lines.len() + 1, |n| n + 1)
}

fn push_trimmed_interior(out: &mut Vec<InteriorLine>, line: usize, start_idx: usize, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let lead = text.len() - text.trim_start().len();
    out.push(InteriorLine::new(line, start_idx + lead + 1, text.trim()));
}

/// Remove the comment leader (`*` plus one optional space) from a line.
///
/// Returns the byte offset where the remaining text starts. Indentation after
/// the leader is preserved; nested-field depth is derived from it.
pub fn strip_leader(line: &str, leader: char) -> (usize, &str) {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    match rest.strip_prefix(leader) {
        Some(after) if !after.starts_with('/') => {
            let skip = indent + leader.len_utf8();
            match after.strip_prefix(' ') {
                Some(text) => (skip + 1, text),
                None => (skip, after),
            }
        }
        _ => (0, line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn ts() -> Delimiters {
        Delimiters::for_language(Language::TypeScript)
    }

    #[test]
    fn test_strip_leader_preserves_nested_indent() {
        assert_eq!(strip_leader(" * @param a - x", '*'), (3, "@param a - x"));
        assert_eq!(strip_leader(" *   - b - y", '*'), (3, "  - b - y"));
        assert_eq!(strip_leader(" *", '*'), (2, ""));
        assert_eq!(strip_leader("plain text", '*'), (0, "plain text"));
    }

    #[test]
    fn test_scan_multiline_block() {
        let text = indoc! {"
            /**
             * Creates a user.
             * @param name - The name
             */
            export function createUser(name) {}
        "};
        let result = scan_blocks(text, ts(), &BTreeSet::from([5]));
        assert_eq!(result.blocks.len(), 1);
        let block = &result.blocks[0];
        assert_eq!((block.start_line, block.end_line), (1, 4));
        assert_eq!(&text[block.span.clone()], "/**\n * Creates a user.\n * @param name - The name\n */");
        let texts: Vec<_> = block.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Creates a user.", "@param name - The name"]);
        assert_eq!(block.lines[1].column, 4);
    }

    #[test]
    fn test_scan_single_line_block() {
        let text = "  /** Returns the id. */\n  getId() {}\n";
        let result = scan_blocks(text, ts(), &BTreeSet::from([2]));
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].lines, vec![InteriorLine::new(1, 7, "Returns the id.")]);
    }

    #[test]
    fn test_plain_comments_are_skipped() {
        let text = indoc! {"
            /* not a doc block
             * /** nested opener
             */
            /**/
            function a() {}
        "};
        let result = scan_blocks(text, ts(), &BTreeSet::from([5]));
        assert!(result.blocks.is_empty());
        assert!(result.unclosed.is_empty());
    }

    #[test]
    fn test_unclosed_block_stops_at_declaration() {
        let text = indoc! {"
            /**
             * Broken block
            export function a() {}
            /** Fine. */
            export function b() {}
        "};
        let result = scan_blocks(text, ts(), &BTreeSet::from([3, 5]));
        assert_eq!(result.unclosed.len(), 1);
        assert_eq!(result.unclosed[0].stopped_at, Some(3));
        assert_eq!(result.unclosed[0].error.line, 1);
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].start_line, 4);
    }

    #[test]
    fn test_unclosed_block_at_eof() {
        let result = scan_blocks("/**\n * dangling\n", ts(), &BTreeSet::new());
        assert_eq!(result.unclosed.len(), 1);
        assert_eq!(result.unclosed[0].stopped_at, None);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "/**\r\n * Brief.\r\n */\r\nfunction a() {}\r\n";
        let result = scan_blocks(text, ts(), &BTreeSet::from([4]));
        assert_eq!(result.blocks[0].lines[0].text, "Brief.");
    }
}
