//! Top-level outline of a describe/it style test file.
//!
//! The file is first masked (comments blanked, newlines kept) and then split
//! into top-level statements by a string-aware bracket-depth scan. Each
//! statement is classified by its head; suites also collect the cases they
//! contain, nested `describe` blocks included.

use crate::extraction::Delimiters;
use once_cell::sync::Lazy;
use regex::Regex;

const TITLE: &str = r#"(?:'(?P<t1>(?:\\.|[^'\\])*)'|"(?P<t2>(?:\\.|[^"\\])*)"|`(?P<t3>(?:\\.|[^`\\])*)`|(?P<ident>[A-Za-z_$][\w$]*)\.name\b)"#;

static SUITE_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:describe|suite|context)(?:\.(?:only|skip|concurrent))?\s*\(\s*{TITLE}"
    ))
    .unwrap()
});

static SUITE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:describe|suite|context)(?:\.\w+)?\s*\(").unwrap()
});

static CASE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)(?:^|[^\w$.])(?P<fn>it|test)(?:\.(?:only|skip|concurrent|failing|todo))?\s*\(\s*{TITLE}"
    ))
    .unwrap()
});

static CASE_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:it|test)(?:\.\w+)?\s*\(").unwrap());

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:import\b|require\s*\(|(?:jest|vi)\.mock\s*\(|(?:const|let|var)\s+[^=]+=\s*require\s*\()",
    )
    .unwrap()
});

static HOOK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:beforeAll|beforeEach|afterAll|afterEach|before|after|setup|teardown)\s*\(")
        .unwrap()
});

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:const|let|var|function|async\s+function|class)\b").unwrap()
});

/// Classification of a top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Import,
    DbSetup,
    FileSetup,
    Suite,
    /// `it`/`test` outside any suite
    Case,
    Other,
}

impl StatementKind {
    /// Position in the `IMPORTS -> DB_SETUP -> FILE_SETUP -> SUITES` order
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Import => Some(0),
            Self::DbSetup => Some(1),
            Self::FileSetup => Some(2),
            Self::Suite => Some(3),
            Self::Case | Self::Other => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::DbSetup => "database setup",
            Self::FileSetup => "file-level setup",
            Self::Suite => "suite",
            Self::Case => "test case",
            Self::Other => "statement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub title: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
    pub column: usize,
    /// Suite title; `None` for non-suites or computed titles
    pub title: Option<String>,
    /// Cases of a suite, nested suites flattened
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, Default)]
pub struct Outline {
    pub statements: Vec<Statement>,
}

impl Outline {
    pub fn suites(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter(|s| s.kind == StatementKind::Suite)
    }
}

/// Build the outline of `text`; `db_keywords` mark setup as database setup.
pub fn outline(text: &str, delimiters: Delimiters, db_keywords: &[String]) -> Outline {
    let masked = mask_comments(text, delimiters);
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(masked.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect();
    let position = |offset: usize| {
        let line = line_starts.partition_point(|&start| start <= offset);
        (line, offset - line_starts[line - 1] + 1)
    };

    let statements = split_statements(&masked)
        .into_iter()
        .map(|range| {
            let source = &masked[range.clone()];
            let (line, column) = position(range.start);
            let kind = classify(source, db_keywords);
            let (title, cases) = if kind == StatementKind::Suite {
                let cases: Vec<Case> = CASE_CALL
                    .captures_iter(source)
                    .filter_map(|caps| {
                        let title = title_of(&caps)?;
                        let offset = caps.name("fn").map_or(0, |m| m.start());
                        Some(Case {
                            title,
                            line: position(range.start + offset).0,
                        })
                    })
                    .collect();
                let title = SUITE_HEAD.captures(source).and_then(|caps| title_of(&caps));
                (title, cases)
            } else {
                (None, Vec::new())
            };
            Statement {
                kind,
                line,
                column,
                title,
                cases,
            }
        })
        .collect();

    Outline { statements }
}

fn title_of(caps: &regex::Captures<'_>) -> Option<String> {
    ["t1", "t2", "t3", "ident"]
        .into_iter()
        .find_map(|group| caps.name(group))
        .map(|m| unescape(m.as_str()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn classify(source: &str, db_keywords: &[String]) -> StatementKind {
    let head = source.trim_start();
    if IMPORT.is_match(head) {
        StatementKind::Import
    } else if SUITE_CALL.is_match(head) {
        StatementKind::Suite
    } else if CASE_HEAD.is_match(head) {
        StatementKind::Case
    } else if HOOK.is_match(head) || DECLARATION.is_match(head) {
        if mentions_any(source, db_keywords) {
            StatementKind::DbSetup
        } else {
            StatementKind::FileSetup
        }
    } else {
        StatementKind::Other
    }
}

/// Whether any identifier word (camelCase split, lower-cased) is a keyword.
fn mentions_any(source: &str, keywords: &[String]) -> bool {
    source
        .split(|c: char| !c.is_ascii_alphanumeric())
        .flat_map(split_camel_case)
        .any(|word| keywords.iter().any(|k| k.eq_ignore_ascii_case(&word)))
}

fn split_camel_case(word: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        if c.is_ascii_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    Str(char),
    LineComment,
    BlockComment,
}

/// Blank out comments, keeping newlines and byte offsets intact.
pub(crate) fn mask_comments(text: &str, delimiters: Delimiters) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = Lexeme::Code;
    let mut chars = text.char_indices();

    while let Some((idx, c)) = chars.next() {
        let rest = &text[idx..];
        match state {
            Lexeme::Code => {
                if rest.starts_with("//") || rest.starts_with("/*") {
                    state = if rest.starts_with("//") {
                        Lexeme::LineComment
                    } else {
                        Lexeme::BlockComment
                    };
                    chars.next();
                    out.push_str("  ");
                    continue;
                }
                if matches!(c, '\'' | '"' | '`') {
                    state = Lexeme::Str(c);
                }
                out.push(c);
            }
            Lexeme::Str(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote || (c == '\n' && quote != '`') {
                    state = Lexeme::Code;
                }
            }
            Lexeme::LineComment => {
                if c == '\n' {
                    state = Lexeme::Code;
                    out.push('\n');
                } else {
                    blank(&mut out, c);
                }
            }
            Lexeme::BlockComment => {
                if rest.starts_with(delimiters.close) {
                    state = Lexeme::Code;
                    for _ in delimiters.close.chars().skip(1) {
                        chars.next();
                    }
                    out.push_str(&" ".repeat(delimiters.close.len()));
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    blank(&mut out, c);
                }
            }
        }
    }
    out
}

fn blank(out: &mut String, c: char) {
    for _ in 0..c.len_utf8() {
        out.push(' ');
    }
}

/// Byte ranges of top-level statements in masked text.
fn split_statements(masked: &str) -> Vec<std::ops::Range<usize>> {
    let mut statements = Vec::new();
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut start: Option<usize> = None;
    let mut last_significant: Option<char> = None;
    let mut pending_end = false;
    let mut chars = masked.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q || (c == '\n' && q != '`') {
                quote = None;
            }
            last_significant = Some(c);
            continue;
        }

        if c.is_whitespace() {
            if c == '\n' && depth == 0 && start.is_some() {
                pending_end = !matches!(
                    last_significant,
                    Some(',' | '.' | '=' | '+' | '-' | '*' | '/' | '&' | '|' | '?' | ':' | '(' | '[' | '{')
                );
            }
            continue;
        }

        if pending_end {
            pending_end = false;
            if c != '.' && c != '?' {
                if let Some(s) = start.take() {
                    statements.push(s..idx);
                }
            }
        }
        if start.is_none() {
            if c == ';' {
                continue;
            }
            start = Some(idx);
        }

        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                if let Some(s) = start.take() {
                    statements.push(s..idx + 1);
                }
                last_significant = None;
                continue;
            }
            _ => {}
        }
        last_significant = Some(c);
    }

    if let Some(s) = start {
        statements.push(s..masked.len());
    }
    statements
}
