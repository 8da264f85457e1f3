//! Shared error types for the application
//!
//! Two tiers exist. [`ExtractionError`] and [`ParseError`] describe syntactic
//! defects in a single comment block or tag; they are carried as data and
//! turned into diagnostics, never propagated. [`Error`] is the hard-failure
//! type returned to callers, chiefly for contract violations by the indexer.

use crate::core::diagnostics::DiagnosticCode;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for doclint operations
#[derive(Debug, Error)]
pub enum Error {
    /// The source indexer supplied inconsistent metadata
    #[error("Contract violation in {file}: {message}")]
    ContractViolation { file: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cache operation errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Worker pool could not be created
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a contract violation for a file
    pub fn contract(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Kinds of block-extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// `/**` without a matching `*/` before EOF or the next declaration
    MalformedDelimiter,
}

/// Syntactic defect scoped to one comment block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ExtractionError {
    pub fn malformed_delimiter(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ExtractionErrorKind::MalformedDelimiter,
            line,
            column,
            message: message.into(),
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self.kind {
            ExtractionErrorKind::MalformedDelimiter => DiagnosticCode::MalformedDelimiter,
        }
    }
}

/// Kinds of tag-level parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Header cannot be split into its name/description parts
    BadTagHeader,
    /// `@tag` that is neither a known kind nor configured as an extra tag
    UnknownTag,
    /// `@usage` without a complete fenced snippet
    UnterminatedFence,
}

/// Syntactic defect scoped to one tag; the rest of the block still parses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            message: message.into(),
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self.kind {
            ParseErrorKind::BadTagHeader => DiagnosticCode::BadTagHeader,
            ParseErrorKind::UnknownTag => DiagnosticCode::UnknownTag,
            ParseErrorKind::UnterminatedFence => DiagnosticCode::UnterminatedFence,
        }
    }
}
