//! Tag parser: turns the stripped interior of a doc block into a tag tree.
//!
//! The interior is split into an untagged preamble (brief plus detail
//! paragraphs) and tag groups. A group starts at a sigil line (`@param`,
//! `@return`, ...) and runs until the next sigil line. Inside `@param`,
//! `@property` and `@return` groups, marker lines (`-` / `+`) introduce nested
//! fields whose depth is derived from relative indentation only.
//!
//! Both marker conventions normalize to the same tree. Defects are scoped: a
//! bad header drops that tag alone, and marker-style problems are warnings.

mod header;
mod render;
mod tag;

pub use header::{
    parse_field_line, parse_named, parse_return, parse_template, parse_throws, FieldLine, Header,
    MarkerClass,
};
pub use render::{render_block, render_interior};
pub use tag::{split_path, CommentBlock, Snippet, Tag, TagKind};

use crate::config::{DoclintConfig, MarkerConvention};
use crate::core::{DiagnosticCode, ParseError, ParseErrorKind};
use crate::extraction::{InteriorLine, RawBlock};
use once_cell::sync::Lazy;
use regex::Regex;

static SIGIL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(?P<tag>[A-Za-z][\w-]*)(?:\s+(?P<rest>.*))?$").unwrap());

const FENCE: &str = "```";

/// Recoverable finding raised while parsing; becomes a warning diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub code: DiagnosticCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseWarning {
    fn new(code: DiagnosticCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            line,
            column,
            message: message.into(),
        }
    }
}

/// Parser output: the tree plus every tag-scoped defect found on the way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBlock {
    pub block: CommentBlock,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

/// Parser state for the group currently being read.
enum Group {
    /// Lines belong to nothing (skipped tag or marker-only tag)
    Skip,
    /// Lines extend `tags[index]`
    Open {
        index: usize,
        indents: Vec<usize>,
        /// Continuations are dropped after a nested line failed to parse
        swallow: bool,
    },
    /// `@usage` seen, waiting for the opening fence
    AwaitFence(Tag),
    /// Inside a fenced snippet
    Fence {
        tag: Tag,
        language: String,
        body: Vec<String>,
    },
}

/// Stateless tag parser configured once per run.
#[derive(Debug, Clone)]
pub struct TagParser {
    config: DoclintConfig,
}

impl Default for TagParser {
    fn default() -> Self {
        Self::new(&DoclintConfig::default())
    }
}

impl TagParser {
    pub fn new(config: &DoclintConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn convention(&self) -> MarkerConvention {
        self.config.marker_convention
    }

    /// Parse an extracted block, keeping its span and line range.
    pub fn parse(&self, raw: &RawBlock) -> ParsedBlock {
        let mut parsed = self.parse_lines(&raw.lines);
        parsed.block.span = raw.span.clone();
        parsed.block.start_line = raw.start_line;
        parsed.block.end_line = raw.end_line;
        parsed
    }

    /// Parse bare interior text, one interior line per text line.
    pub fn parse_text(&self, interior: &str) -> ParsedBlock {
        let lines: Vec<InteriorLine> = interior
            .lines()
            .enumerate()
            .map(|(idx, text)| InteriorLine::new(idx + 1, 1, text.trim_end()))
            .collect();
        let mut parsed = self.parse_lines(&lines);
        if let (Some(first), Some(last)) = (lines.first(), lines.last()) {
            parsed.block.start_line = first.line;
            parsed.block.end_line = last.line;
        }
        parsed
    }

    pub fn parse_lines(&self, lines: &[InteriorLine]) -> ParsedBlock {
        let mut parsed = ParsedBlock::default();
        let first_sigil = lines
            .iter()
            .position(|l| SIGIL_LINE.is_match(l.text.trim_start()))
            .unwrap_or(lines.len());

        let (preamble, tagged) = lines.split_at(first_sigil);
        self.parse_preamble(preamble, &mut parsed.block);

        let mut group = Group::Skip;
        for line in tagged {
            group = self.step(group, line, &mut parsed);
        }
        self.finish(group, &mut parsed);
        parsed
    }

    fn parse_preamble(&self, preamble: &[InteriorLine], block: &mut CommentBlock) {
        let mut paragraphs: Vec<(usize, usize, String)> = Vec::new();
        let mut in_paragraph = false;
        for line in preamble {
            if line.is_blank() {
                in_paragraph = false;
                continue;
            }
            let text = line.text.trim();
            match paragraphs.last_mut() {
                Some((_, _, para)) if in_paragraph => {
                    para.push(' ');
                    para.push_str(text);
                }
                _ => {
                    let indent = line.text.len() - line.text.trim_start().len();
                    paragraphs.push((line.line, line.column + indent, text.to_string()));
                }
            }
            in_paragraph = true;
        }

        let mut paragraphs = paragraphs.into_iter();
        if let Some((line, column, text)) = paragraphs.next() {
            let mut brief = Tag::new(TagKind::Brief, line, column);
            brief.description = text;
            block.tags.push(brief);
        }
        block.details = paragraphs.map(|(_, _, text)| text).collect();
    }

    fn step(&self, group: Group, line: &InteriorLine, parsed: &mut ParsedBlock) -> Group {
        match group {
            // Fence bodies are verbatim; `@` lines inside them are code.
            Group::Fence {
                mut tag,
                language,
                mut body,
            } => {
                if line.text.trim() != FENCE {
                    body.push(line.text.clone());
                    return Group::Fence {
                        tag,
                        language,
                        body,
                    };
                }
                tag.snippet = Some(Snippet {
                    language,
                    body: dedent(&body),
                });
                parsed.block.tags.push(tag);
                Group::Open {
                    index: parsed.block.tags.len() - 1,
                    indents: Vec::new(),
                    swallow: false,
                }
            }
            other => self.step_outside_fence(other, line, parsed),
        }
    }

    fn step_outside_fence(&self, group: Group, line: &InteriorLine, parsed: &mut ParsedBlock) -> Group {
        let trimmed = line.text.trim_start();
        let indent = line.text.len() - trimmed.len();
        let sigil = SIGIL_LINE
            .captures(trimmed)
            .filter(|_| !nested_in(&group, line.column + indent, parsed));
        if let Some(caps) = sigil {
            self.finish(group, parsed);
            let name = caps.name("tag").map_or("", |m| m.as_str());
            let rest = caps.name("rest").map_or("", |m| m.as_str());
            return self.open_group(name, rest, line.line, line.column + indent, parsed);
        }

        match group {
            Group::AwaitFence(mut tag) => match trimmed.strip_prefix(FENCE) {
                Some(language) => Group::Fence {
                    tag,
                    language: language.trim().to_string(),
                    body: Vec::new(),
                },
                None => {
                    tag.append_description(trimmed);
                    Group::AwaitFence(tag)
                }
            },
            Group::Open {
                index,
                mut indents,
                mut swallow,
            } => {
                if line.is_blank() {
                    return Group::Open {
                        index,
                        indents,
                        swallow,
                    };
                }
                let field = parsed.block.tags[index]
                    .kind
                    .accepts_children()
                    .then(|| parse_field_line(&line.text))
                    .flatten();
                match field {
                    Some(field) => {
                        swallow = !self.push_field(index, &mut indents, field, line, parsed);
                    }
                    None if !swallow => {
                        last_entry(&mut parsed.block.tags[index]).append_description(trimmed);
                    }
                    None => {}
                }
                Group::Open {
                    index,
                    indents,
                    swallow,
                }
            }
            other => other,
        }
    }

    fn open_group(
        &self,
        name: &str,
        rest: &str,
        line: usize,
        column: usize,
        parsed: &mut ParsedBlock,
    ) -> Group {
        if name == "async" {
            parsed.block.async_marker = true;
            return Group::Skip;
        }
        let Some(kind) = TagKind::from_sigil(name) else {
            if !self.config.is_extra_tag(name) {
                parsed.errors.push(ParseError::new(
                    ParseErrorKind::UnknownTag,
                    line,
                    column,
                    format!("unknown tag `@{}`", name),
                ));
            }
            return Group::Skip;
        };

        let mut tag = Tag::new(kind, line, column);
        if kind == TagKind::Usage {
            tag.append_description(rest);
            return Group::AwaitFence(tag);
        }

        let header = match kind {
            TagKind::Param | TagKind::Property => parse_named(rest),
            TagKind::Return => parse_return(rest),
            TagKind::Throws => parse_throws(rest),
            TagKind::Template => parse_template(rest),
            TagKind::Brief | TagKind::Usage => None,
        };
        let Some(header) = header else {
            parsed.errors.push(ParseError::new(
                ParseErrorKind::BadTagHeader,
                line,
                column,
                format!("cannot read `@{} {}`: {}", name, rest.trim(), expected_form(kind)),
            ));
            return Group::Skip;
        };

        apply_header(&mut tag, header);
        parsed.block.tags.push(tag);
        Group::Open {
            index: parsed.block.tags.len() - 1,
            indents: Vec::new(),
            swallow: false,
        }
    }

    /// Attach a nested field line; returns false when its header was unreadable.
    fn push_field(
        &self,
        index: usize,
        indents: &mut Vec<usize>,
        field: FieldLine,
        line: &InteriorLine,
        parsed: &mut ParsedBlock,
    ) -> bool {
        let column = line.column + field.indent;
        let Some(header) = field.header else {
            parsed.errors.push(ParseError::new(
                ParseErrorKind::BadTagHeader,
                line.line,
                column,
                format!("cannot read nested field `{}`", line.text.trim()),
            ));
            return false;
        };

        let depth = nesting_depth(indents, field.indent);
        let expected = MarkerClass::for_depth(depth);
        if field.marker != expected {
            parsed.warnings.push(ParseWarning::new(
                DiagnosticCode::MarkerStyle,
                line.line,
                column,
                format!(
                    "depth {} uses `{}` markers, found `{}`",
                    depth,
                    expected.symbol(),
                    field.marker.symbol()
                ),
            ));
        }
        if field.convention != self.convention() {
            parsed.warnings.push(ParseWarning::new(
                DiagnosticCode::MarkerStyle,
                line.line,
                column,
                format!(
                    "nested field written in {} style, configured style is {}",
                    convention_name(field.convention),
                    convention_name(self.convention())
                ),
            ));
        }
        if let Some(max) = self.config.max_tag_depth.filter(|&max| depth > max) {
            parsed.warnings.push(ParseWarning::new(
                DiagnosticCode::DepthExceeded,
                line.line,
                column,
                format!("nested field depth {} exceeds the limit of {}", depth, max),
            ));
        }

        let mut child = Tag::new(TagKind::Property, line.line, column);
        apply_header(&mut child, header);
        attach(&mut parsed.block.tags[index], child, depth);
        true
    }

    fn finish(&self, group: Group, parsed: &mut ParsedBlock) {
        match group {
            Group::AwaitFence(tag) => parsed.errors.push(ParseError::new(
                ParseErrorKind::UnterminatedFence,
                tag.line,
                tag.column,
                "`@usage` is not followed by a fenced snippet",
            )),
            Group::Fence { tag, .. } => parsed.errors.push(ParseError::new(
                ParseErrorKind::UnterminatedFence,
                tag.line,
                tag.column,
                "`@usage` snippet fence is never closed",
            )),
            Group::Skip | Group::Open { .. } => {}
        }
    }
}

/// A sigil line indented past the open group's header continues that group.
fn nested_in(group: &Group, column: usize, parsed: &ParsedBlock) -> bool {
    match group {
        Group::Open { index, .. } => column > parsed.block.tags[*index].column,
        _ => false,
    }
}

fn apply_header(tag: &mut Tag, header: Header) {
    tag.name = header.name;
    tag.ty = header.ty;
    tag.optional = header.optional;
    tag.description = header.description;
}

fn expected_form(kind: TagKind) -> &'static str {
    match kind {
        TagKind::Param | TagKind::Property => "expected `name[?][: type] - description`",
        TagKind::Return => "expected `[name][: type] - description`",
        TagKind::Throws => "expected `{ErrorKind} description`",
        TagKind::Template => "expected `T - description`",
        TagKind::Brief | TagKind::Usage => "unexpected header",
    }
}

fn convention_name(convention: MarkerConvention) -> &'static str {
    match convention {
        MarkerConvention::DashPlus => "DASH_PLUS",
        MarkerConvention::BraceTyped => "BRACE_TYPED",
    }
}

/// Depth of a nested line from the indents of the enclosing nested lines.
///
/// Only relative indentation matters; widths are never checked.
fn nesting_depth(indents: &mut Vec<usize>, indent: usize) -> usize {
    while let Some(&top) = indents.last() {
        if indent > top {
            break;
        }
        indents.pop();
        if indent == top {
            break;
        }
    }
    indents.push(indent);
    indents.len()
}

/// Insert `child` at `depth` below `root`, along the most recent branch.
fn attach(root: &mut Tag, mut child: Tag, depth: usize) {
    let mut parent = root;
    for _ in 1..depth {
        if parent.children.is_empty() {
            break;
        }
        let last = parent.children.len() - 1;
        parent = &mut parent.children[last];
    }
    child.depth = parent.depth + 1;
    parent.children.push(child);
}

/// Most recently added entry of a tag tree (the rightmost, deepest node).
fn last_entry(tag: &mut Tag) -> &mut Tag {
    match tag.children.len() {
        0 => tag,
        n => last_entry(&mut tag.children[n - 1]),
    }
}

/// Remove the indentation common to every non-blank line.
fn dedent(lines: &[String]) -> String {
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(common..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
