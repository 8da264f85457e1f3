//! Diagnostic Reporter: ordering, strict-mode promotion and report writers.

use crate::core::{Diagnostic, Result, Severity, ValidationReport};
use colored::*;
use std::io::Write;

/// Build the final report from unordered per-unit diagnostics.
///
/// The order is fixed by (file, line, column, code, message), so worker
/// completion order never shows in the output. In strict mode every warning
/// becomes an error. A cancelled run never passes.
pub fn assemble(
    mut diagnostics: Vec<Diagnostic>,
    strict: bool,
    complete: bool,
    units_checked: usize,
) -> ValidationReport {
    if strict {
        for diagnostic in &mut diagnostics {
            diagnostic.severity = Severity::Error;
        }
    }
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    diagnostics.dedup();

    let passed = complete && !diagnostics.iter().any(Diagnostic::is_error);
    ValidationReport {
        diagnostics,
        passed,
        complete,
        units_checked,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &ValidationReport) -> Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &ValidationReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Human-readable listing, one `file:line:col` line per diagnostic.
pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &ValidationReport) -> Result<()> {
        for diagnostic in &report.diagnostics {
            let severity = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            writeln!(
                self.writer,
                "{}:{}:{}: {} [{}] {}",
                diagnostic.file.display(),
                diagnostic.line,
                diagnostic.column,
                severity,
                diagnostic.code.as_str().dimmed(),
                diagnostic.message
            )?;
        }
        if !report.diagnostics.is_empty() {
            writeln!(self.writer)?;
        }

        let verdict = if report.passed {
            "passed".green().bold()
        } else {
            "failed".red().bold()
        };
        writeln!(
            self.writer,
            "{}: {} error(s), {} warning(s) in {} unit(s){}",
            verdict,
            report.error_count(),
            report.warning_count(),
            report.units_checked,
            if report.complete { "" } else { " (cancelled)" }
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn create_writer<'a>(format: OutputFormat, out: Box<dyn Write + 'a>) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DiagnosticCode;
    use pretty_assertions::assert_eq;

    fn diag(file: &str, line: usize, code: DiagnosticCode) -> Diagnostic {
        Diagnostic::new(code, file, line, 1, format!("{} at {}", code, line))
    }

    #[test]
    fn test_assemble_orders_by_file_then_line() {
        let report = assemble(
            vec![
                diag("src/b.ts", 1, DiagnosticCode::MissingDoc),
                diag("src/a.ts", 9, DiagnosticCode::ThrowsMissing),
                diag("src/a.ts", 2, DiagnosticCode::UnknownParam),
                diag("src/a.ts", 2, DiagnosticCode::ParamMissing),
            ],
            false,
            true,
            2,
        );
        let order: Vec<(&str, usize, DiagnosticCode)> = report
            .diagnostics
            .iter()
            .map(|d| (d.file.to_str().unwrap(), d.line, d.code))
            .collect();
        assert_eq!(
            order,
            vec![
                ("src/a.ts", 2, DiagnosticCode::UnknownParam),
                ("src/a.ts", 2, DiagnosticCode::ParamMissing),
                ("src/a.ts", 9, DiagnosticCode::ThrowsMissing),
                ("src/b.ts", 1, DiagnosticCode::MissingDoc),
            ]
        );
        assert!(!report.passed);
    }

    #[test]
    fn test_warnings_pass_unless_strict() {
        let warnings = vec![diag("src/a.ts", 3, DiagnosticCode::RedundantType)];

        let lenient = assemble(warnings.clone(), false, true, 1);
        assert!(lenient.passed);
        assert_eq!(lenient.warning_count(), 1);

        let strict = assemble(warnings, true, true, 1);
        assert!(!strict.passed);
        assert_eq!(strict.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_cancelled_run_never_passes() {
        let report = assemble(Vec::new(), false, false, 0);
        assert!(!report.complete);
        assert!(!report.passed);
    }

    #[test]
    fn test_json_writer_uses_report_field_names() {
        let report = assemble(vec![diag("src/a.ts", 4, DiagnosticCode::ReturnMissing)], false, true, 1);
        let mut out = Vec::new();
        JsonWriter::new(&mut out).write_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["passed"], false);
        assert_eq!(value["unitsChecked"], 1);
        assert_eq!(value["diagnostics"][0]["code"], "RETURN_MISSING");
        assert_eq!(value["diagnostics"][0]["severity"], "error");
    }

    #[test]
    fn test_terminal_writer_lists_locations() {
        let report = assemble(vec![diag("src/a.ts", 4, DiagnosticCode::ThrowsUnused)], false, true, 1);
        let mut out = Vec::new();
        TerminalWriter::new(&mut out).write_report(&report).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("src/a.ts:4:1: "));
        assert!(text.contains("THROWS_UNUSED"));
        assert!(text.contains("0 error(s), 1 warning(s) in 1 unit(s)"));
    }
}
