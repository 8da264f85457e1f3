//! Layout checks for unit and integration test files.

use super::outline::{outline, Outline, Statement, StatementKind};
use crate::config::{DoclintConfig, TestLayoutConfig};
use crate::core::{
    Diagnostic, DiagnosticCode, Result, Severity, SourceUnit, TestFileKind, TestUnit,
};
use crate::extraction::Delimiters;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

static RETURNS_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*returns\s+\{[^}]+\}\s+when\s+\S").unwrap());

static THROWS_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*throws\s+\{[^}]+\}\s+when\s+\S").unwrap());

/// Test structure validator configured once per run.
#[derive(Debug, Clone)]
pub struct TestStructureValidator {
    layout: TestLayoutConfig,
    flow_file: Regex,
    coverage_gap: Severity,
}

impl TestStructureValidator {
    /// # Errors
    ///
    /// Fails when `tests.flow_file_pattern` is not a valid regex.
    pub fn new(config: &DoclintConfig) -> Result<Self> {
        Ok(Self {
            layout: config.tests.clone(),
            flow_file: config.tests.flow_file_regex()?,
            coverage_gap: if config.test_coverage_gap_is_error {
                Severity::Error
            } else {
                Severity::Warning
            },
        })
    }

    /// Check one test file. `paired` is the source file under test, if known.
    pub fn validate(&self, unit: &TestUnit, paired: Option<&SourceUnit>) -> Vec<Diagnostic> {
        let outline = outline(
            &unit.text,
            Delimiters::for_language(unit.language),
            &self.layout.db_setup_keywords,
        );
        let mut check = FileCheck {
            file: &unit.path,
            diagnostics: Vec::new(),
        };

        check.stray_cases(&outline);
        match super::infer_kind(unit, paired.is_some()) {
            TestFileKind::Unit => {
                check.unit_order(&outline);
                if let Some(source) = paired {
                    check.suite_names(&outline, source);
                } else {
                    tracing::debug!(
                        file = %unit.path.display(),
                        "unit test file has no paired source; suite names not checked"
                    );
                }
                for suite in outline.suites() {
                    check.unit_coverage(suite, self.coverage_gap);
                }
            }
            TestFileKind::Integration => {
                check.flow_name(&unit.path, &self.flow_file);
                check.integration_order(&outline);
                for suite in outline.suites() {
                    check.flow_coverage(suite, &self.layout.negative_case_keywords, self.coverage_gap);
                }
            }
        }
        check.diagnostics
    }
}

struct FileCheck<'a> {
    file: &'a Path,
    diagnostics: Vec<Diagnostic>,
}

impl FileCheck<'_> {
    fn at(&self, code: DiagnosticCode, line: usize, column: usize, message: String) -> Diagnostic {
        Diagnostic::new(code, self.file, line, column, message)
    }

    fn emit(&mut self, code: DiagnosticCode, line: usize, column: usize, message: String) {
        let diagnostic = self.at(code, line, column, message);
        self.diagnostics.push(diagnostic);
    }

    fn stray_cases(&mut self, outline: &Outline) {
        for statement in &outline.statements {
            if statement.kind == StatementKind::Case {
                self.emit(
                    DiagnosticCode::CaseOutsideSuite,
                    statement.line,
                    statement.column,
                    "test case is not inside a suite".to_string(),
                );
            }
        }
    }

    /// `IMPORTS -> DB_SETUP -> FILE_SETUP -> SUITES`, never fatal.
    fn unit_order(&mut self, outline: &Outline) {
        let mut furthest: Option<(u8, StatementKind)> = None;
        for statement in &outline.statements {
            let Some(rank) = statement.kind.rank() else {
                continue;
            };
            match furthest {
                Some((max, after)) if rank < max => {
                    self.emit(
                        DiagnosticCode::OrderViolation,
                        statement.line,
                        statement.column,
                        format!("{} appears after {}", statement.kind.label(), after.label()),
                    );
                }
                Some((max, _)) if rank == max => {}
                _ => furthest = Some((rank, statement.kind)),
            }
        }
    }

    /// Setup must precede suites; the order among setup blocks is free.
    fn integration_order(&mut self, outline: &Outline) {
        let mut seen_suite = false;
        for statement in &outline.statements {
            match statement.kind {
                StatementKind::Suite => seen_suite = true,
                StatementKind::Import | StatementKind::DbSetup | StatementKind::FileSetup
                    if seen_suite =>
                {
                    self.emit(
                        DiagnosticCode::OrderViolation,
                        statement.line,
                        statement.column,
                        format!("{} appears after a suite", statement.kind.label()),
                    );
                }
                _ => {}
            }
        }
    }

    fn suite_names(&mut self, outline: &Outline, source: &SourceUnit) {
        let exported: BTreeSet<&str> = source.exported_function_names().into_iter().collect();
        let mut covered = BTreeSet::new();

        for suite in outline.suites() {
            let Some(title) = suite.title.as_deref() else {
                continue;
            };
            if exported.contains(title) {
                covered.insert(title);
            } else {
                self.emit(
                    DiagnosticCode::SuiteNameMismatch,
                    suite.line,
                    suite.column,
                    format!(
                        "suite `{}` does not name an exported function of {}",
                        title,
                        source.path.display()
                    ),
                );
            }
        }

        for symbol in source
            .symbols
            .iter()
            .filter(|s| exported.contains(s.name.as_str()) && !covered.contains(s.name.as_str()))
        {
            let diagnostic = self
                .at(
                    DiagnosticCode::SuiteMissing,
                    1,
                    1,
                    format!("exported function `{}` has no suite", symbol.name),
                )
                .with_symbol(symbol.id());
            self.diagnostics.push(diagnostic);
        }
    }

    fn unit_coverage(&mut self, suite: &Statement, severity: Severity) {
        let returns = suite.cases.iter().any(|c| RETURNS_CASE.is_match(&c.title));
        let throws = suite.cases.iter().any(|c| THROWS_CASE.is_match(&c.title));
        let missing: Vec<&str> = [
            (!returns).then_some("`returns {T} when ...`"),
            (!throws).then_some("`throws {E} when ...`"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if missing.is_empty() {
            return;
        }
        let diagnostic = self
            .at(
                DiagnosticCode::CoverageGap,
                suite.line,
                suite.column,
                format!(
                    "suite `{}` has no {} case",
                    suite.title.as_deref().unwrap_or("<computed>"),
                    missing.join(" or ")
                ),
            )
            .with_severity(severity);
        self.diagnostics.push(diagnostic);
    }

    fn flow_name(&mut self, path: &Path, pattern: &Regex) {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !pattern.is_match(name) {
            self.emit(
                DiagnosticCode::FlowNameMismatch,
                1,
                1,
                format!(
                    "integration test file `{}` does not follow the flow naming convention `{}`",
                    name,
                    pattern.as_str()
                ),
            );
        }
    }

    fn flow_coverage(&mut self, suite: &Statement, negative_keywords: &[String], severity: Severity) {
        let (negative, happy): (Vec<_>, Vec<_>) = suite
            .cases
            .iter()
            .partition(|c| is_negative(&c.title, negative_keywords));
        let missing: Vec<&str> = [
            happy.is_empty().then_some("happy-path"),
            negative.is_empty().then_some("negative-path"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if missing.is_empty() {
            return;
        }
        let diagnostic = self
            .at(
                DiagnosticCode::CoverageGap,
                suite.line,
                suite.column,
                format!(
                    "flow `{}` has no {} case",
                    suite.title.as_deref().unwrap_or("<computed>"),
                    missing.join(" or ")
                ),
            )
            .with_severity(severity);
        self.diagnostics.push(diagnostic);
    }
}

fn is_negative(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|k| title.contains(&k.to_lowercase()))
}
