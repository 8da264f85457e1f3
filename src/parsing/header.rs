//! Header grammar for sigil lines and nested field lines.
//!
//! ```text
//! @param    <name>[?][: <type>] - <description>
//! @property <name>[?][: <type>] - <description>
//! @return   [<name>[?]][: <type>] - <description>
//! @throws   {<ErrorKind>} [-] <description>
//! @template <T> [extends <Bound>] - <description>
//!
//! nested (DASH_PLUS):   <marker> <name>[?][: <type>] [- <description>]
//! nested (BRACE_TYPED): <marker> {<type>} <name>[?] [- <description>]
//! ```

use crate::config::MarkerConvention;
use once_cell::sync::Lazy;
use regex::Regex;

const NAME: &str = r"[A-Za-z_$][\w$]*(?:\[\])?(?:\.[A-Za-z_$][\w$]*(?:\[\])?)*";

static NAMED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<name>{NAME})(?P<opt>\?)?(?:\s*:\s*(?P<ty>.+?))?\s+-(?:\s+(?P<desc>.*?))?\s*$"
    ))
    .unwrap()
});

static UNNAMED_RETURN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?::\s*(?P<ty>.+?)\s+)?-(?:\s+(?P<desc>.*?))?\s*$").unwrap());

static THROWS_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\s*(?P<kind>[^{}]+?)\s*\}(?:\s*-)?(?:\s+(?P<desc>.*?))?\s*$").unwrap()
});

static TEMPLATE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^<?(?P<name>[A-Za-z_$][\w$]*)>?(?:\s+extends\s+(?P<ty>.+?))?\s+-(?:\s+(?P<desc>.*?))?\s*$",
    )
    .unwrap()
});

static DASH_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<name>{NAME})(?P<opt>\?)?(?:\s*:\s*(?P<ty>.+?))?(?:\s+-(?:\s+(?P<desc>.*?))?)?\s*$"
    ))
    .unwrap()
});

static BRACED_FIELD_REST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<name>{NAME})(?P<opt>\?)?(?:\s+-(?:\s+(?P<desc>.*?))?)?\s*$"
    ))
    .unwrap()
});

/// Name/type/description parts of a parsed header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub name: Option<String>,
    pub ty: Option<String>,
    pub optional: bool,
    pub description: String,
}

fn capture(caps: &regex::Captures<'_>, group: &str) -> Option<String> {
    caps.name(group)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn header_from(caps: &regex::Captures<'_>) -> Header {
    Header {
        name: capture(caps, "name"),
        ty: capture(caps, "ty"),
        optional: caps.name("opt").is_some(),
        description: capture(caps, "desc").unwrap_or_default(),
    }
}

/// `@param` / `@property` header
pub fn parse_named(rest: &str) -> Option<Header> {
    NAMED_HEADER.captures(rest.trim()).map(|caps| header_from(&caps))
}

/// `@return` header; the name is optional
pub fn parse_return(rest: &str) -> Option<Header> {
    let rest = rest.trim();
    UNNAMED_RETURN
        .captures(rest)
        .map(|caps| header_from(&caps))
        .or_else(|| parse_named(rest))
}

/// `@throws {Kind} description`; the kind is returned as the name
pub fn parse_throws(rest: &str) -> Option<Header> {
    THROWS_HEADER.captures(rest.trim()).map(|caps| Header {
        name: capture(&caps, "kind"),
        ty: None,
        optional: false,
        description: capture(&caps, "desc").unwrap_or_default(),
    })
}

/// `@template T - description`, the bound (if any) is stored as the type
pub fn parse_template(rest: &str) -> Option<Header> {
    TEMPLATE_HEADER
        .captures(rest.trim())
        .map(|caps| header_from(&caps))
}

/// Marker symbol class; classes alternate strictly by depth parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    Dash,
    Plus,
}

impl MarkerClass {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Dash),
            '+' => Some(Self::Plus),
            _ => None,
        }
    }

    /// Expected class for a nested depth (1-based)
    pub fn for_depth(depth: usize) -> Self {
        if depth % 2 == 1 {
            Self::Dash
        } else {
            Self::Plus
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Dash => '-',
            Self::Plus => '+',
        }
    }
}

/// A nested field line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine {
    /// Leading whitespace width, the only depth signal
    pub indent: usize,
    pub marker: MarkerClass,
    pub convention: MarkerConvention,
    pub header: Option<Header>,
}

/// Recognize a nested field line. Returns `None` when the line does not start
/// with a marker (it is then continuation text).
pub fn parse_field_line(text: &str) -> Option<FieldLine> {
    let indent = text.len() - text.trim_start().len();
    let body = &text[indent..];
    let mut chars = body.chars();
    let marker = chars.next().and_then(MarkerClass::from_char)?;
    let after = chars.as_str();
    if !(after.starts_with(char::is_whitespace) || after.starts_with('{')) {
        return None;
    }
    let content = after.trim();

    let (convention, header) = if content.starts_with('{') {
        (MarkerConvention::BraceTyped, parse_braced_field(content))
    } else {
        (
            MarkerConvention::DashPlus,
            DASH_FIELD.captures(content).map(|caps| header_from(&caps)),
        )
    };

    Some(FieldLine {
        indent,
        marker,
        convention,
        header,
    })
}

fn parse_braced_field(content: &str) -> Option<Header> {
    let (ty, rest) = split_braced(content)?;
    let caps = BRACED_FIELD_REST.captures(rest.trim())?;
    let mut header = header_from(&caps);
    let ty = ty.trim();
    header.ty = (!ty.is_empty()).then(|| ty.to_string());
    Some(header)
}

/// Split `{inner} rest` honoring nested braces, e.g. `{ {id: string} } user`.
fn split_braced(content: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, c) in content.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((&content[1..idx], &content[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}
