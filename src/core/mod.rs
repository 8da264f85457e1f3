pub mod diagnostics;
pub mod errors;
pub mod types;

pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, ValidationReport};
pub use errors::{
    Error, ExtractionError, ExtractionErrorKind, ParseError, ParseErrorKind, Result,
};
pub use types::{
    Field, Language, Parameter, SourceUnit, Symbol, SymbolKind, TestFileKind, TestUnit, TypeRef,
};
