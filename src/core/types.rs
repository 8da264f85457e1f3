//! Shared data model for source units, symbols and their signatures.
//!
//! Everything in this module is supplied by the source indexer and is
//! read-only for the duration of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported host languages.
///
/// Every supported language uses the `/** ... */` doc-block convention with a
/// `*` leader on continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Java,
    Kotlin,
    Php,
}

impl Language {
    /// Get file extensions for this language
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
            Language::Php => &["php"],
        }
    }

    /// Fence tags accepted on a `@usage` snippet for this language
    pub fn fence_tags(&self) -> &[&str] {
        match self {
            Language::TypeScript => &["ts", "typescript", "tsx"],
            Language::JavaScript => &["js", "javascript", "jsx", "mjs", "cjs"],
            Language::Java => &["java"],
            Language::Kotlin => &["kotlin", "kt"],
            Language::Php => &["php"],
        }
    }

    /// Get the display name for this language
    pub fn display_name(&self) -> &str {
        match self {
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Kotlin => "Kotlin",
            Language::Php => "PHP",
        }
    }

    /// Infer the language from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        [
            Language::TypeScript,
            Language::JavaScript,
            Language::Java,
            Language::Kotlin,
            Language::Php,
        ]
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
    }

    pub fn accepts_fence_tag(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        self.fence_tags().iter().any(|t| *t == tag)
    }
}

/// Kind of documented symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Property,
}

impl SymbolKind {
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

/// A (possibly structured) type as exposed by the signature.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeRef {
    /// Type as written in source, e.g. `Promise<User>`
    pub text: String,
    /// Fields exposed by the signature, empty for opaque types
    #[serde(default)]
    pub fields: Vec<Field>,
    /// The type has its own documentation block elsewhere, so an unexpanded
    /// reference to it is accepted
    #[serde(default)]
    pub documented_elsewhere: bool,
}

impl TypeRef {
    pub fn named(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: Vec::new(),
            documented_elsewhere: false,
        }
    }

    pub fn structured(text: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            text: text.into(),
            fields,
            documented_elsewhere: false,
        }
    }

    pub fn documented(mut self) -> Self {
        self.documented_elsewhere = true;
        self
    }

    /// Whether this type carries no value (`void`, `Promise<void>`, `Unit`, ...)
    pub fn is_void(&self) -> bool {
        let compact: String = self.text.chars().filter(|c| !c.is_whitespace()).collect();
        matches!(
            compact.as_str(),
            "" | "void"
                | "Void"
                | "undefined"
                | "never"
                | "Unit"
                | "Promise<void>"
                | "Promise<undefined>"
                | "CompletableFuture<Void>"
        )
    }
}

/// Named field of a structured type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub optional: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Parameter of a callable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub optional: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Exported or internal symbol with its collaborator-supplied signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub raise_kinds: Vec<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_exported: bool,
    /// Fields matched by `@property` on class/interface/type symbols
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Collaborator classification: performs validation, I/O or domain logic
    #[serde(default)]
    pub requires_docs: bool,
    /// 1-based line of the declaration
    pub declaration_line: usize,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, declaration_line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            generics: Vec::new(),
            raise_kinds: Vec::new(),
            is_async: false,
            is_exported: false,
            fields: Vec::new(),
            requires_docs: false,
            declaration_line,
        }
    }

    pub fn function(name: impl Into<String>, declaration_line: usize) -> Self {
        Self::new(SymbolKind::Function, name, declaration_line)
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_return(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_generic(mut self, name: impl Into<String>) -> Self {
        self.generics.push(name.into());
        self
    }

    pub fn with_raise(mut self, kind: impl Into<String>) -> Self {
        self.raise_kinds.push(kind.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Stable identifier used as the diagnostic subject
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.declaration_line)
    }

    /// Whether the symbol produces a value that needs a `@return` entry
    pub fn returns_value(&self) -> bool {
        self.kind.is_callable() && self.return_type.as_ref().is_some_and(|t| !t.is_void())
    }
}

/// One source file as handed over by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
    pub language: Language,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    /// Last modification time, used only by the result cache
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, language: Language) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            language,
            symbols: Vec::new(),
            modified: None,
        }
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Names of exported functions, the suites a paired unit test must cover
    pub fn exported_function_names(&self) -> Vec<&str> {
        self.symbols
            .iter()
            .filter(|s| s.is_exported && s.kind == SymbolKind::Function)
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// Layout template a test file is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFileKind {
    /// One suite per exported function of the paired source file
    Unit,
    /// Free-form flow suites with happy and negative paths
    Integration,
}

/// One test file as handed over by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestUnit {
    pub path: PathBuf,
    pub text: String,
    pub language: Language,
    /// Explicit kind; inferred from the path when absent
    #[serde(default)]
    pub kind: Option<TestFileKind>,
    /// Path of the source file under test (matched against `SourceUnit::path`)
    #[serde(default)]
    pub paired_source: Option<PathBuf>,
}

impl TestUnit {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, language: Language) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            language,
            kind: None,
            paired_source: None,
        }
    }

    pub fn paired_with(mut self, source: impl Into<PathBuf>) -> Self {
        self.paired_source = Some(source.into());
        self
    }

    pub fn with_kind(mut self, kind: TestFileKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("kt"), Some(Language::Kotlin));
        assert_eq!(Language::from_extension("rs"), None);
    }

    #[test]
    fn test_fence_tags_are_case_insensitive() {
        assert!(Language::TypeScript.accepts_fence_tag("TS"));
        assert!(Language::TypeScript.accepts_fence_tag("typescript"));
        assert!(!Language::TypeScript.accepts_fence_tag("js"));
        assert!(Language::Kotlin.accepts_fence_tag("kt"));
    }

    #[test]
    fn test_void_detection() {
        assert!(TypeRef::named("void").is_void());
        assert!(TypeRef::named("Promise< void >").is_void());
        assert!(!TypeRef::named("Promise<User>").is_void());
    }

    #[test]
    fn test_returns_value_only_for_callables() {
        let func = Symbol::function("load", 3).with_return(TypeRef::named("User"));
        assert!(func.returns_value());

        let mut class = func.clone();
        class.kind = SymbolKind::Class;
        assert!(!class.returns_value());

        let void_fn = Symbol::function("reset", 3).with_return(TypeRef::named("void"));
        assert!(!void_fn.returns_value());
    }

    #[test]
    fn test_symbol_deserializes_from_indexer_json() {
        let json = r#"{
            "kind": "function",
            "name": "createUser",
            "parameters": [{"name": "input", "type": {"text": "CreateUserInput"}, "optional": false}],
            "returnType": {"text": "Promise<User>"},
            "raiseKinds": ["ValidationError"],
            "isAsync": true,
            "isExported": true,
            "declarationLine": 12
        }"#;
        let symbol: Symbol = serde_json::from_str(json).unwrap();
        assert_eq!(symbol.name, "createUser");
        assert!(symbol.is_async);
        assert_eq!(symbol.parameters[0].ty.as_ref().unwrap().text, "CreateUserInput");
        assert_eq!(symbol.raise_kinds, vec!["ValidationError".to_string()]);
        assert_eq!(symbol.id(), "createUser@12");
    }

    #[test]
    fn test_test_unit_deserializes() {
        let json = r#"{
            "path": "tests/users.test.ts",
            "text": "",
            "language": "typescript",
            "kind": "unit",
            "pairedSource": "src/users.ts"
        }"#;
        let unit: TestUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.kind, Some(TestFileKind::Unit));
        assert_eq!(unit.paired_source, Some(PathBuf::from("src/users.ts")));
    }
}
