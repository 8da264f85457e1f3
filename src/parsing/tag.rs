//! Normalized tag tree produced by the parser and consumed by the validator.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Brief,
    Template,
    Property,
    Param,
    Return,
    Throws,
    Usage,
}

impl TagKind {
    /// Kind for a `@name` sigil, `None` for unknown or marker-only tags
    pub fn from_sigil(name: &str) -> Option<Self> {
        match name {
            "template" => Some(Self::Template),
            "property" | "prop" => Some(Self::Property),
            "param" | "arg" => Some(Self::Param),
            "return" | "returns" => Some(Self::Return),
            "throws" | "throw" => Some(Self::Throws),
            "usage" => Some(Self::Usage),
            _ => None,
        }
    }

    pub fn sigil(&self) -> &'static str {
        match self {
            Self::Brief => "",
            Self::Template => "@template",
            Self::Property => "@property",
            Self::Param => "@param",
            Self::Return => "@return",
            Self::Throws => "@throws",
            Self::Usage => "@usage",
        }
    }

    /// Whether nested field lines may follow the header
    pub fn accepts_children(&self) -> bool {
        matches!(self, Self::Param | Self::Property | Self::Return)
    }
}

/// Fenced code snippet attached to a `@usage` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub language: String,
    pub body: String,
}

/// One entry of the tag tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub kind: TagKind,
    pub name: Option<String>,
    pub description: String,
    /// Explicit type; `None` means the type is elided
    pub ty: Option<String>,
    pub optional: bool,
    /// 0 for tags introduced by a sigil, parent depth + 1 for nested fields
    pub depth: usize,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<Snippet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Tag>,
}

impl Tag {
    pub fn new(kind: TagKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            name: None,
            description: String::new(),
            ty: None,
            optional: false,
            depth: 0,
            line,
            column,
            snippet: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn append_description(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(text);
    }

    /// Name split into path segments, with `[]` element markers dropped
    pub fn path_segments(&self) -> Vec<String> {
        self.name
            .as_deref()
            .map(split_path)
            .unwrap_or_default()
    }

    /// Deepest nesting level below this tag (0 when it has no children)
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Split a dotted tag name (`options.retry.limit`, `items[].id`) into segments.
pub fn split_path(name: &str) -> Vec<String> {
    name.split('.')
        .map(|segment| segment.trim_end_matches("[]").to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Parsed doc block: the brief (when present) followed by tags in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentBlock {
    pub span: Range<usize>,
    pub start_line: usize,
    pub end_line: usize,
    /// `@async` marker present
    pub async_marker: bool,
    /// Paragraphs after the brief, before the first tag
    pub details: Vec<String>,
    pub tags: Vec<Tag>,
}

impl CommentBlock {
    pub fn brief(&self) -> Option<&Tag> {
        self.tags.first().filter(|t| t.kind == TagKind::Brief)
    }

    pub fn tags_of(&self, kind: TagKind) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |t| t.kind == kind)
    }
}
