//! Canonical rendering of a tag tree.
//!
//! Output re-parses to the same tree: brief, detail paragraphs, `@async`,
//! then tags in source order with nested fields indented two spaces per level.

use super::header::MarkerClass;
use super::tag::{CommentBlock, Tag, TagKind};
use crate::config::MarkerConvention;
use std::fmt::Write;

/// Render the block interior (no delimiters, no leaders).
pub fn render_interior(block: &CommentBlock, convention: MarkerConvention) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(brief) = block.brief() {
        lines.push(brief.description.clone());
    }
    for detail in &block.details {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(detail.clone());
    }
    if !lines.is_empty() && (block.async_marker || block.tags.iter().any(|t| t.kind != TagKind::Brief)) {
        lines.push(String::new());
    }
    if block.async_marker {
        lines.push("@async".to_string());
    }
    for tag in block.tags.iter().filter(|t| t.kind != TagKind::Brief) {
        render_tag(tag, convention, &mut lines);
    }

    lines.join("\n")
}

/// Render a complete `/** ... */` block.
pub fn render_block(block: &CommentBlock, convention: MarkerConvention) -> String {
    let mut out = String::from("/**\n");
    for line in render_interior(block, convention).lines() {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            let _ = writeln!(out, " * {}", line);
        }
    }
    out.push_str(" */");
    out
}

fn render_tag(tag: &Tag, convention: MarkerConvention, lines: &mut Vec<String>) {
    let name = tag.name.as_deref().unwrap_or("");
    let optional = if tag.optional { "?" } else { "" };
    let head = match tag.kind {
        TagKind::Param | TagKind::Property => {
            format!("{} {}{}{}", tag.kind.sigil(), name, optional, type_suffix(tag))
        }
        TagKind::Return => match (&tag.name, &tag.ty) {
            (Some(_), _) => format!("@return {}{}{}", name, optional, type_suffix(tag)),
            (None, Some(ty)) => format!("@return : {}", ty),
            (None, None) => "@return".to_string(),
        },
        TagKind::Throws => {
            let line = format!("@throws {{{}}}", name);
            lines.push(with_text(line, &tag.description, false));
            return;
        }
        TagKind::Template => match &tag.ty {
            Some(bound) => format!("@template {} extends {}", name, bound),
            None => format!("@template {}", name),
        },
        TagKind::Usage => {
            lines.push(with_text("@usage".to_string(), &tag.description, false));
            if let Some(snippet) = &tag.snippet {
                lines.push(format!("```{}", snippet.language));
                lines.extend(snippet.body.lines().map(String::from));
                lines.push("```".to_string());
            }
            return;
        }
        TagKind::Brief => return,
    };
    lines.push(with_text(head, &tag.description, true));
    for child in &tag.children {
        render_field(child, 1, convention, lines);
    }
}

fn render_field(tag: &Tag, depth: usize, convention: MarkerConvention, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let marker = MarkerClass::for_depth(depth).symbol();
    let name = tag.name.as_deref().unwrap_or("");
    let optional = if tag.optional { "?" } else { "" };
    let head = match (convention, &tag.ty) {
        (MarkerConvention::BraceTyped, Some(ty)) => {
            format!("{}{} {{{}}} {}{}", indent, marker, ty, name, optional)
        }
        _ => format!("{}{} {}{}{}", indent, marker, name, optional, type_suffix(tag)),
    };
    let line = if tag.description.is_empty() {
        head
    } else {
        format!("{} - {}", head, tag.description)
    };
    lines.push(line);
    for child in &tag.children {
        render_field(child, depth + 1, convention, lines);
    }
}

fn type_suffix(tag: &Tag) -> String {
    tag.ty
        .as_deref()
        .map(|ty| format!(": {}", ty))
        .unwrap_or_default()
}

/// Append the description; `dash` keeps the ` -` separator even when empty.
fn with_text(head: String, description: &str, dash: bool) -> String {
    match (description.is_empty(), dash) {
        (true, true) => format!("{} -", head),
        (true, false) => head,
        (false, true) => format!("{} - {}", head, description),
        (false, false) => format!("{} {}", head, description),
    }
}
