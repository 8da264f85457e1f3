//! Diagnostic data model shared by the validators and the reporter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Every diagnostic the checker can emit.
///
/// Serialized in SCREAMING_SNAKE_CASE so the report matches the code names
/// used in configuration and documentation (`MISSING_DOC`, `PARAM_MISSING`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Block-level syntax
    MalformedDelimiter,
    BadTagHeader,
    UnknownTag,
    UnterminatedFence,
    MarkerStyle,
    DepthExceeded,
    // Schema
    MissingDoc,
    BriefMissing,
    AsyncMarkerMismatch,
    TemplateMismatch,
    UnknownParam,
    ParamMissing,
    UnknownProperty,
    PropertyMissing,
    DuplicateTag,
    OptionalityMismatch,
    RedundantType,
    UnresolvedType,
    ReturnMissing,
    DuplicateReturn,
    ReturnFieldMissing,
    ReturnFieldUnknown,
    ThrowsMissing,
    ThrowsUnused,
    LanguageTagMismatch,
    // Test structure
    SuiteNameMismatch,
    SuiteMissing,
    CoverageGap,
    OrderViolation,
    FlowNameMismatch,
    CaseOutsideSuite,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedDelimiter => "MALFORMED_DELIMITER",
            Self::BadTagHeader => "BAD_TAG_HEADER",
            Self::UnknownTag => "UNKNOWN_TAG",
            Self::UnterminatedFence => "UNTERMINATED_FENCE",
            Self::MarkerStyle => "MARKER_STYLE",
            Self::DepthExceeded => "DEPTH_EXCEEDED",
            Self::MissingDoc => "MISSING_DOC",
            Self::BriefMissing => "BRIEF_MISSING",
            Self::AsyncMarkerMismatch => "ASYNC_MARKER_MISMATCH",
            Self::TemplateMismatch => "TEMPLATE_MISMATCH",
            Self::UnknownParam => "UNKNOWN_PARAM",
            Self::ParamMissing => "PARAM_MISSING",
            Self::UnknownProperty => "UNKNOWN_PROPERTY",
            Self::PropertyMissing => "PROPERTY_MISSING",
            Self::DuplicateTag => "DUPLICATE_TAG",
            Self::OptionalityMismatch => "OPTIONALITY_MISMATCH",
            Self::RedundantType => "REDUNDANT_TYPE",
            Self::UnresolvedType => "UNRESOLVED_TYPE",
            Self::ReturnMissing => "RETURN_MISSING",
            Self::DuplicateReturn => "DUPLICATE_RETURN",
            Self::ReturnFieldMissing => "RETURN_FIELD_MISSING",
            Self::ReturnFieldUnknown => "RETURN_FIELD_UNKNOWN",
            Self::ThrowsMissing => "THROWS_MISSING",
            Self::ThrowsUnused => "THROWS_UNUSED",
            Self::LanguageTagMismatch => "LANGUAGE_TAG_MISMATCH",
            Self::SuiteNameMismatch => "SUITE_NAME_MISMATCH",
            Self::SuiteMissing => "SUITE_MISSING",
            Self::CoverageGap => "COVERAGE_GAP",
            Self::OrderViolation => "ORDER_VIOLATION",
            Self::FlowNameMismatch => "FLOW_NAME_MISMATCH",
            Self::CaseOutsideSuite => "CASE_OUTSIDE_SUITE",
        }
    }

    /// Severity before strict-mode or coverage-gap promotion
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::MalformedDelimiter
            | Self::BadTagHeader
            | Self::UnknownTag
            | Self::UnterminatedFence
            | Self::BriefMissing
            | Self::TemplateMismatch
            | Self::UnknownParam
            | Self::ParamMissing
            | Self::UnknownProperty
            | Self::PropertyMissing
            | Self::DuplicateTag
            | Self::ReturnMissing
            | Self::DuplicateReturn
            | Self::ReturnFieldMissing
            | Self::SuiteNameMismatch => Severity::Error,
            // MISSING_DOC is an error for exported symbols; the validator
            // downgrades it for internal ones.
            Self::MissingDoc => Severity::Error,
            Self::MarkerStyle
            | Self::DepthExceeded
            | Self::AsyncMarkerMismatch
            | Self::OptionalityMismatch
            | Self::RedundantType
            | Self::UnresolvedType
            | Self::ReturnFieldUnknown
            | Self::ThrowsMissing
            | Self::ThrowsUnused
            | Self::LanguageTagMismatch
            | Self::SuiteMissing
            | Self::CoverageGap
            | Self::OrderViolation
            | Self::FlowNameMismatch
            | Self::CaseOutsideSuite => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported defect with severity, code, and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Subject symbol id (`name@line`), absent for file-level findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity
    pub fn new(
        code: DiagnosticCode,
        file: impl AsRef<Path>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
            line,
            column,
            code,
            severity: code.default_severity(),
            message: message.into(),
            symbol: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Ordering key used by the reporter: file, line, column, then code
    pub(crate) fn sort_key(&self) -> (&Path, usize, usize, DiagnosticCode, &str) {
        (
            self.file.as_path(),
            self.line,
            self.column,
            self.code,
            self.message.as_str(),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.file.display(),
            self.line,
            self.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Outcome of one run: every diagnostic in report order plus the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
    pub passed: bool,
    /// False when the run was cancelled before every unit was checked
    pub complete: bool,
    pub units_checked: usize,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn count_of(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&DiagnosticCode::ReturnFieldMissing).unwrap();
        assert_eq!(json, "\"RETURN_FIELD_MISSING\"");
        assert_eq!(DiagnosticCode::ReturnFieldMissing.as_str(), "RETURN_FIELD_MISSING");
    }

    #[test]
    fn test_as_str_matches_serde_name() {
        for code in [
            DiagnosticCode::MalformedDelimiter,
            DiagnosticCode::UnresolvedType,
            DiagnosticCode::SuiteNameMismatch,
            DiagnosticCode::CaseOutsideSuite,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json.trim_matches('"'), code.as_str());
        }
    }

    #[test]
    fn test_display_format() {
        let diag = Diagnostic::new(
            DiagnosticCode::ParamMissing,
            "src/users.ts",
            10,
            1,
            "parameter `token` is not documented",
        );
        assert_eq!(
            diag.to_string(),
            "src/users.ts:10:1: error [PARAM_MISSING] parameter `token` is not documented"
        );
    }
}
