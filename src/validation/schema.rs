//! Per-symbol documentation contract checks.

use super::paths::{ancestors, field_paths, parameter_paths, DocPaths, SignaturePath};
use crate::core::{Diagnostic, DiagnosticCode, Language, Severity, Symbol};
use crate::parsing::{CommentBlock, Tag, TagKind};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Codes and wording for one family of path checks.
#[derive(Debug, Clone, Copy)]
struct PathRules {
    unknown: DiagnosticCode,
    missing: DiagnosticCode,
    noun: &'static str,
}

const PARAMS: PathRules = PathRules {
    unknown: DiagnosticCode::UnknownParam,
    missing: DiagnosticCode::ParamMissing,
    noun: "parameter",
};

const PROPERTIES: PathRules = PathRules {
    unknown: DiagnosticCode::UnknownProperty,
    missing: DiagnosticCode::PropertyMissing,
    noun: "property",
};

const RETURN_FIELDS: PathRules = PathRules {
    unknown: DiagnosticCode::ReturnFieldUnknown,
    missing: DiagnosticCode::ReturnFieldMissing,
    noun: "return field",
};

/// Collects diagnostics for one symbol and its parsed block.
pub(crate) struct SymbolCheck<'a> {
    file: &'a Path,
    language: Language,
    symbol: &'a Symbol,
    block: &'a CommentBlock,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SymbolCheck<'a> {
    pub(crate) fn new(
        file: &'a Path,
        language: Language,
        symbol: &'a Symbol,
        block: &'a CommentBlock,
    ) -> Self {
        Self {
            file,
            language,
            symbol,
            block,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> Vec<Diagnostic> {
        self.check_brief();
        self.check_templates();
        self.check_paths(
            DocPaths::from_tags(self.block.tags_of(TagKind::Param)),
            &parameter_paths(&self.symbol.parameters),
            PARAMS,
            self.anchor(),
            true,
        );
        self.check_paths(
            DocPaths::from_tags(self.block.tags_of(TagKind::Property)),
            &field_paths(&self.symbol.fields),
            PROPERTIES,
            self.anchor(),
            true,
        );
        self.check_return();
        self.check_throws();
        self.check_usage();
        self.diagnostics
    }

    fn emit(&mut self, code: DiagnosticCode, at: (usize, usize), message: String) {
        self.diagnostics.push(
            Diagnostic::new(code, self.file, at.0, at.1, message).with_symbol(self.symbol.id()),
        );
    }

    /// Location for findings about something absent from the block
    fn anchor(&self) -> (usize, usize) {
        (self.block.start_line.max(1), 1)
    }

    fn check_brief(&mut self) {
        let has_brief = self
            .block
            .brief()
            .is_some_and(|b| !b.description.trim().is_empty());
        if !has_brief {
            self.emit(
                DiagnosticCode::BriefMissing,
                self.anchor(),
                format!("doc block for `{}` has no brief summary line", self.symbol.name),
            );
        }
        if self.symbol.is_async != self.block.async_marker {
            let message = if self.symbol.is_async {
                format!("`{}` is async but its doc block has no `@async` marker", self.symbol.name)
            } else {
                format!("`{}` is not async but its doc block has an `@async` marker", self.symbol.name)
            };
            self.emit(DiagnosticCode::AsyncMarkerMismatch, self.anchor(), message);
        }
    }

    fn check_templates(&mut self) {
        let generics: BTreeSet<&str> = self.symbol.generics.iter().map(String::as_str).collect();
        let mut seen = BTreeSet::new();
        for tag in self.block.tags_of(TagKind::Template) {
            let name = tag.name.as_deref().unwrap_or("");
            if !generics.contains(name) {
                self.emit(
                    DiagnosticCode::TemplateMismatch,
                    (tag.line, tag.column),
                    format!("`@template {}` does not name a generic parameter", name),
                );
            } else if !seen.insert(name) {
                self.emit(
                    DiagnosticCode::TemplateMismatch,
                    (tag.line, tag.column),
                    format!("generic parameter `{}` is documented twice", name),
                );
            }
        }
        for generic in generics.difference(&seen) {
            self.emit(
                DiagnosticCode::TemplateMismatch,
                self.anchor(),
                format!("generic parameter `{}` has no `@template` entry", generic),
            );
        }
    }

    /// Match documented paths against signature paths.
    ///
    /// Only the outermost undocumented path is reported: a nested field is
    /// expected once its parent is documented, and never below a type that is
    /// documented elsewhere.
    fn check_paths(
        &mut self,
        docs: DocPaths<'_>,
        signature: &[SignaturePath],
        rules: PathRules,
        missing_at: (usize, usize),
        require: bool,
    ) {
        let by_key: HashMap<&str, usize> = signature
            .iter()
            .enumerate()
            .map(|(idx, path)| (path.key.as_str(), idx))
            .collect();
        let mut documented = vec![false; signature.len()];

        for (key, tag) in &docs.entries {
            let at = (tag.line, tag.column);
            match by_key.get(key.as_str()).copied() {
                Some(idx) if documented[idx] => self.emit(
                    DiagnosticCode::DuplicateTag,
                    at,
                    format!("{} `{}` is documented more than once", rules.noun, key),
                ),
                Some(idx) => {
                    documented[idx] = true;
                    self.check_matched(key, tag, &signature[idx], rules);
                }
                None => self.check_unmatched(key, tag, signature, &by_key, rules),
            }
        }

        if !require {
            return;
        }
        for (idx, path) in signature.iter().enumerate() {
            if documented[idx] || path.optional || !expected(signature, &documented, idx) {
                continue;
            }
            self.emit(
                rules.missing,
                missing_at,
                format!(
                    "{} `{}` of `{}` is not documented",
                    rules.noun, path.key, self.symbol.name
                ),
            );
        }
    }

    fn check_matched(&mut self, key: &str, tag: &Tag, path: &SignaturePath, rules: PathRules) {
        let at = (tag.line, tag.column);
        if tag.optional != path.optional {
            let (doc, sig) = if path.optional {
                ("required", "optional")
            } else {
                ("optional", "required")
            };
            self.emit(
                DiagnosticCode::OptionalityMismatch,
                at,
                format!("{} `{}` is documented as {} but is {} in the signature", rules.noun, key, doc, sig),
            );
        }
        // An elided type on a matched path is resolved by the match itself,
        // even when the signature is untyped.
        if let (Some(_), Some(sig)) = (&tag.ty, &path.ty) {
            self.emit(
                DiagnosticCode::RedundantType,
                at,
                format!("type of {} `{}` is already visible in the signature as `{}`", rules.noun, key, sig),
            );
        }
    }

    fn check_unmatched(
        &mut self,
        key: &str,
        tag: &Tag,
        signature: &[SignaturePath],
        by_key: &HashMap<&str, usize>,
        rules: PathRules,
    ) {
        let at = (tag.line, tag.column);
        // Below an opaque type the signature cannot confirm or refute the path.
        let under_opaque = ancestors(key)
            .find_map(|parent| by_key.get(parent))
            .is_some_and(|&idx| !signature[idx].structured);
        if !under_opaque {
            self.emit(
                rules.unknown,
                at,
                format!("{} `{}` does not exist on `{}`", rules.noun, key, self.symbol.name),
            );
        }
        if tag.ty.is_none() {
            self.emit(
                DiagnosticCode::UnresolvedType,
                at,
                format!("type of {} `{}` is elided and no signature path provides it", rules.noun, key),
            );
        }
    }

    fn check_return(&mut self) {
        let returns: Vec<&Tag> = self.block.tags_of(TagKind::Return).collect();
        for extra in returns.iter().skip(1) {
            self.emit(
                DiagnosticCode::DuplicateReturn,
                (extra.line, extra.column),
                "only one `@return` entry is allowed".to_string(),
            );
        }

        let Some(tag) = returns.first().copied() else {
            if self.symbol.returns_value() {
                self.emit(
                    DiagnosticCode::ReturnMissing,
                    self.anchor(),
                    format!("`{}` returns a value but has no `@return` entry", self.symbol.name),
                );
            }
            return;
        };

        let at = (tag.line, tag.column);
        let Some(return_type) = self.symbol.return_type.as_ref() else {
            return;
        };

        if tag.ty.is_some() && !return_type.text.trim().is_empty() {
            self.emit(
                DiagnosticCode::RedundantType,
                at,
                format!("return type is already visible in the signature as `{}`", return_type.text),
            );
        }
        if return_type.fields.is_empty() {
            return;
        }

        // A return type documented elsewhere may stay unexpanded, but any
        // fields that are listed must still exist.
        self.check_paths(
            DocPaths::from_children(tag),
            &field_paths(&return_type.fields),
            RETURN_FIELDS,
            at,
            !return_type.documented_elsewhere,
        );
    }

    fn check_throws(&mut self) {
        let raised: BTreeSet<&str> = self.symbol.raise_kinds.iter().map(String::as_str).collect();
        let documented: BTreeSet<&str> = self
            .block
            .tags_of(TagKind::Throws)
            .filter_map(|t| t.name.as_deref())
            .collect();

        for kind in raised.difference(&documented) {
            self.emit(
                DiagnosticCode::ThrowsMissing,
                self.anchor(),
                format!("`{}` can raise `{}` but has no `@throws {{{}}}` entry", self.symbol.name, kind, kind),
            );
        }
        let unused: Vec<&Tag> = self
            .block
            .tags_of(TagKind::Throws)
            .filter(|t| t.name.as_deref().is_some_and(|n| !raised.contains(n)))
            .collect();
        for tag in unused {
            self.emit(
                DiagnosticCode::ThrowsUnused,
                (tag.line, tag.column),
                format!(
                    "`@throws {{{}}}` is documented but `{}` is not known to raise it",
                    tag.name.as_deref().unwrap_or(""),
                    self.symbol.name
                ),
            );
        }
    }

    fn check_usage(&mut self) {
        let language = self.language;
        let mismatched: Vec<(usize, usize, String)> = self
            .block
            .tags_of(TagKind::Usage)
            .filter_map(|t| t.snippet.as_ref().map(|s| (t, s)))
            .filter(|(_, s)| !language.accepts_fence_tag(&s.language))
            .map(|(t, s)| (t.line, t.column, s.language.clone()))
            .collect();
        for (line, column, tag) in mismatched {
            let message = if tag.is_empty() {
                format!("usage snippet has no language tag, expected one of {}", language.fence_tags().join(", "))
            } else {
                format!(
                    "usage snippet is tagged `{}` but `{}` is {} code",
                    tag,
                    self.symbol.name,
                    language.display_name()
                )
            };
            self.emit(DiagnosticCode::LanguageTagMismatch, (line, column), message);
        }
    }
}

/// Whether an undocumented signature path should have been documented.
fn expected(signature: &[SignaturePath], documented: &[bool], idx: usize) -> bool {
    let Some(parent) = signature[idx].parent else {
        return true;
    };
    if !documented[parent] {
        return false;
    }
    let mut cursor = Some(parent);
    while let Some(current) = cursor {
        if signature[current].documented_elsewhere {
            return false;
        }
        cursor = signature[current].parent;
    }
    true
}

/// Presence check for a symbol without an associated block.
pub(crate) fn missing_doc(
    file: &Path,
    symbol: &Symbol,
    require_internal_docs: bool,
) -> Option<Diagnostic> {
    let severity = if symbol.is_exported {
        Severity::Error
    } else if symbol.requires_docs && require_internal_docs {
        Severity::Warning
    } else {
        return None;
    };
    let scope = if symbol.is_exported { "exported" } else { "internal" };
    Some(
        Diagnostic::new(
            DiagnosticCode::MissingDoc,
            file,
            symbol.declaration_line,
            1,
            format!("{} `{}` has no doc block", scope, symbol.name),
        )
        .with_severity(severity)
        .with_symbol(symbol.id()),
    )
}
