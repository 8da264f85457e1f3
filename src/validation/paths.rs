//! Dotted-path views of signatures and tag trees.
//!
//! Both sides are flattened to keys like `options.retry.limit` so that a tag
//! tree can be matched against a signature one path at a time.

use crate::core::{Field, Parameter, TypeRef};
use crate::parsing::{split_path, Tag};

/// One documentable path exposed by a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePath {
    pub key: String,
    /// Type text as written in the signature, `None` when untyped
    pub ty: Option<String>,
    pub optional: bool,
    /// Index of the enclosing path in the same list
    pub parent: Option<usize>,
    /// The type exposes fields of its own
    pub structured: bool,
    pub documented_elsewhere: bool,
}

/// Every parameter path, nested fields included, in declaration order.
pub fn parameter_paths(params: &[Parameter]) -> Vec<SignaturePath> {
    let mut out = Vec::new();
    for param in params {
        collect(&mut out, None, "", &param.name, param.ty.as_ref(), param.optional);
    }
    out
}

/// Every field path of a class, interface, type, or structured return value.
pub fn field_paths(fields: &[Field]) -> Vec<SignaturePath> {
    let mut out = Vec::new();
    for field in fields {
        collect(&mut out, None, "", &field.name, field.ty.as_ref(), field.optional);
    }
    out
}

fn collect(
    out: &mut Vec<SignaturePath>,
    parent: Option<usize>,
    prefix: &str,
    name: &str,
    ty: Option<&TypeRef>,
    optional: bool,
) {
    let segment = name.trim_end_matches("[]");
    let key = if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    };
    let index = out.len();
    out.push(SignaturePath {
        key: key.clone(),
        ty: ty.map(|t| t.text.clone()).filter(|t| !t.trim().is_empty()),
        optional,
        parent,
        structured: ty.is_some_and(|t| !t.fields.is_empty()),
        documented_elsewhere: ty.is_some_and(|t| t.documented_elsewhere),
    });
    if let Some(ty) = ty {
        for field in &ty.fields {
            collect(out, Some(index), &key, &field.name, field.ty.as_ref(), field.optional);
        }
    }
}

/// Flattened tag tree with dotted keys, in source order.
#[derive(Debug, Default)]
pub struct DocPaths<'a> {
    pub entries: Vec<(String, &'a Tag)>,
}

impl<'a> DocPaths<'a> {
    /// Flatten top-level tags (their names are the roots of the keys).
    pub fn from_tags(tags: impl IntoIterator<Item = &'a Tag>) -> Self {
        let mut paths = Self::default();
        for tag in tags {
            paths.push(tag, "");
        }
        paths
    }

    /// Flatten the children of `tag`; the tag itself is the unnamed root.
    pub fn from_children(tag: &'a Tag) -> Self {
        let mut paths = Self::default();
        for child in &tag.children {
            paths.push(child, "");
        }
        paths
    }

    fn push(&mut self, tag: &'a Tag, prefix: &str) {
        let Some(name) = tag.name.as_deref() else {
            return;
        };
        let own = split_path(name).join(".");
        let key = if prefix.is_empty() {
            own
        } else {
            format!("{}.{}", prefix, own)
        };
        self.entries.push((key.clone(), tag));
        for child in &tag.children {
            self.push(child, &key);
        }
    }
}

/// Parent keys of `key`, nearest first: `a.b.c` yields `a.b`, then `a`.
pub fn ancestors(key: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(key.rsplit_once('.').map(|(head, _)| head), |k| {
        k.rsplit_once('.').map(|(head, _)| head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::TagParser;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn options_param() -> Parameter {
        Parameter::new(
            "options",
            TypeRef::structured(
                "Options",
                vec![
                    Field::new("timeout", TypeRef::named("number")).optional(),
                    Field::new(
                        "retry",
                        TypeRef::structured(
                            "Retry",
                            vec![Field::new("limit", TypeRef::named("number"))],
                        ),
                    ),
                ],
            ),
        )
    }

    #[test]
    fn test_parameter_paths_are_nested() {
        let paths = parameter_paths(&[Parameter::untyped("id"), options_param()]);
        let keys: Vec<_> = paths.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["id", "options", "options.timeout", "options.retry", "options.retry.limit"]
        );
        assert_eq!(paths[0].ty, None);
        assert!(paths[1].structured);
        assert_eq!(paths[2].parent, Some(1));
        assert!(paths[2].optional);
        assert_eq!(paths[4].parent, Some(3));
    }

    #[test]
    fn test_array_suffix_is_ignored() {
        let paths = field_paths(&[Field::new(
            "items[]",
            TypeRef::structured("Item[]", vec![Field::new("id", TypeRef::named("string"))]),
        )]);
        assert_eq!(paths[1].key, "items.id");
    }

    #[test]
    fn test_doc_paths_join_dotted_and_nested_names() {
        let parsed = TagParser::default().parse_text(indoc! {"
            Brief.
            @param options - Options
              - retry - Retry policy
                + limit - Max attempts
            @param options.timeout - Timeout
        "});
        let docs = DocPaths::from_tags(parsed.block.tags.iter().skip(1));
        let keys: Vec<_> = docs.entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["options", "options.retry", "options.retry.limit", "options.timeout"]
        );
    }

    #[test]
    fn test_ancestors() {
        let found: Vec<_> = ancestors("a.b.c").collect();
        assert_eq!(found, vec!["a.b", "a"]);
        assert_eq!(ancestors("a").count(), 0);
    }
}
