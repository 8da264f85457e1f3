//! Property-based tests for the tag parser and canonical renderer
//!
//! These tests verify invariants that should hold for all well-formed blocks:
//! - parse -> render -> parse yields the same tag tree
//! - both marker conventions normalize to the same tree
//! - rendering is a fixed point after the first pass

use doclint::config::{DoclintConfig, MarkerConvention};
use doclint::parsing::{render_interior, CommentBlock, Tag, TagParser};
use proptest::prelude::*;

/// A nested field as generated: name, optional, type, description, children
#[derive(Debug, Clone)]
struct GenField {
    name: String,
    optional: bool,
    ty: String,
    description: String,
    children: Vec<GenField>,
}

#[derive(Debug, Clone)]
struct GenBlock {
    brief: String,
    details: Vec<String>,
    is_async: bool,
    templates: Vec<String>,
    params: Vec<GenField>,
    returns: Option<(String, Vec<GenField>)>,
    throws: Vec<(String, String)>,
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}"
}

fn type_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,6}"
}

fn sentence() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,8}( [a-z]{1,8}){0,4}"
}

fn field(depth: u32) -> BoxedStrategy<GenField> {
    let children = if depth == 0 {
        Just(Vec::new()).boxed()
    } else {
        prop::collection::vec(field(depth - 1), 0..3).boxed()
    };
    (identifier(), any::<bool>(), type_name(), sentence(), children)
        .prop_map(|(name, optional, ty, description, children)| GenField {
            name,
            optional,
            ty,
            description,
            children,
        })
        .boxed()
}

fn block() -> impl Strategy<Value = GenBlock> {
    (
        sentence(),
        prop::collection::vec(sentence(), 0..2),
        any::<bool>(),
        prop::collection::vec(type_name(), 0..2),
        prop::collection::vec(field(2), 0..3),
        prop::option::of((sentence(), prop::collection::vec(field(1), 0..3))),
        prop::collection::vec((type_name(), sentence()), 0..2),
    )
        .prop_map(
            |(brief, details, is_async, templates, params, returns, throws)| GenBlock {
                brief,
                details,
                is_async,
                templates,
                params,
                returns,
                throws,
            },
        )
}

fn write_fields(out: &mut Vec<String>, fields: &[GenField], depth: usize, convention: MarkerConvention) {
    for f in fields {
        let indent = "  ".repeat(depth);
        let marker = if depth % 2 == 1 { '-' } else { '+' };
        let optional = if f.optional { "?" } else { "" };
        out.push(match convention {
            MarkerConvention::DashPlus => format!(
                "{indent}{marker} {}{optional}: {} - {}",
                f.name, f.ty, f.description
            ),
            MarkerConvention::BraceTyped => format!(
                "{indent}{marker} {{{}}} {}{optional} - {}",
                f.ty, f.name, f.description
            ),
        });
        write_fields(out, &f.children, depth + 1, convention);
    }
}

fn interior(block: &GenBlock, convention: MarkerConvention) -> String {
    let mut out = vec![block.brief.clone()];
    for detail in &block.details {
        out.push(String::new());
        out.push(detail.clone());
    }
    out.push(String::new());
    if block.is_async {
        out.push("@async".to_string());
    }
    for t in &block.templates {
        out.push(format!("@template {t} - Type parameter"));
    }
    for p in &block.params {
        let optional = if p.optional { "?" } else { "" };
        out.push(format!("@param {}{optional} - {}", p.name, p.description));
        write_fields(&mut out, &p.children, 1, convention);
    }
    if let Some((description, fields)) = &block.returns {
        out.push(format!("@return - {description}"));
        write_fields(&mut out, fields, 1, convention);
    }
    for (kind, description) in &block.throws {
        out.push(format!("@throws {{{kind}}} {description}"));
    }
    out.join("\n")
}

/// Position-free view of a tag tree
#[derive(Debug, PartialEq, Eq)]
struct Shape {
    kind: String,
    name: Option<String>,
    ty: Option<String>,
    optional: bool,
    description: String,
    children: Vec<Shape>,
}

fn shape(tag: &Tag) -> Shape {
    Shape {
        kind: format!("{:?}", tag.kind),
        name: tag.name.clone(),
        ty: tag.ty.clone(),
        optional: tag.optional,
        description: tag.description.clone(),
        children: tag.children.iter().map(shape).collect(),
    }
}

fn tree(block: &CommentBlock) -> (bool, Vec<String>, Vec<Shape>) {
    (
        block.async_marker,
        block.details.clone(),
        block.tags.iter().map(shape).collect(),
    )
}

fn parser(convention: MarkerConvention) -> TagParser {
    TagParser::new(&DoclintConfig {
        marker_convention: convention,
        ..Default::default()
    })
}

proptest! {
    /// Property: re-parsing the canonical rendering yields the same tree
    #[test]
    fn prop_parse_render_parse_is_stable(generated in block()) {
        let parser = parser(MarkerConvention::DashPlus);
        let first = parser.parse_text(&interior(&generated, MarkerConvention::DashPlus));
        prop_assert!(first.errors.is_empty(), "unexpected errors: {:?}", first.errors);
        prop_assert!(first.warnings.is_empty(), "unexpected warnings: {:?}", first.warnings);

        let rendered = render_interior(&first.block, MarkerConvention::DashPlus);
        let second = parser.parse_text(&rendered);
        prop_assert!(second.errors.is_empty());
        prop_assert_eq!(tree(&first.block), tree(&second.block));

        // Canonical form is a fixed point
        prop_assert_eq!(render_interior(&second.block, MarkerConvention::DashPlus), rendered);
    }

    /// Property: the two marker conventions describe the same tree
    #[test]
    fn prop_conventions_normalize_to_one_tree(generated in block()) {
        let dash = parser(MarkerConvention::DashPlus)
            .parse_text(&interior(&generated, MarkerConvention::DashPlus));
        let braced = parser(MarkerConvention::BraceTyped)
            .parse_text(&interior(&generated, MarkerConvention::BraceTyped));
        prop_assert!(braced.errors.is_empty());
        prop_assert!(braced.warnings.is_empty());
        prop_assert_eq!(tree(&dash.block), tree(&braced.block));

        let rendered = render_interior(&braced.block, MarkerConvention::BraceTyped);
        let reparsed = parser(MarkerConvention::BraceTyped).parse_text(&rendered);
        prop_assert_eq!(tree(&braced.block), tree(&reparsed.block));
    }
}
