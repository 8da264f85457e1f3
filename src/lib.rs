// Export modules for library usage
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod extraction;
pub mod parsing;
pub mod pipeline;
pub mod report;
pub mod testing;
pub mod validation;

// Re-export commonly used types
pub use crate::core::{
    Diagnostic, DiagnosticCode, Error, Field, Language, Parameter, Result, Severity, SourceUnit,
    Symbol, SymbolKind, TestFileKind, TestUnit, TypeRef, ValidationReport,
};

pub use crate::config::{load_config, load_config_from, DoclintConfig, MarkerConvention};

pub use crate::extraction::{extract, BlockAssociation};

pub use crate::parsing::{render_block, CommentBlock, ParsedBlock, Tag, TagKind, TagParser};

pub use crate::validation::{validate_unit, SchemaValidator};

pub use crate::testing::TestStructureValidator;

pub use crate::report::{assemble, create_writer, OutputFormat, OutputWriter};

pub use crate::pipeline::{CancellationToken, Engine};

pub use crate::cache::ResultCache;
