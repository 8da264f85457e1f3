//! Schema validation: checks each symbol's tag tree against its signature.
//!
//! Extraction and parse defects are converted into diagnostics here, so a unit
//! always yields a complete list of findings. The only hard failure is a
//! contract violation reported by the extractor.

mod paths;
mod schema;

pub use paths::{ancestors, field_paths, parameter_paths, DocPaths, SignaturePath};

use crate::config::DoclintConfig;
use crate::core::{Diagnostic, ExtractionError, Result, SourceUnit, Symbol};
use crate::extraction::{extract, BlockAssociation, SymbolBlock};
use crate::parsing::{ParsedBlock, TagParser};
use schema::{missing_doc, SymbolCheck};
use std::path::Path;

/// Validator configured once per run; cheap to share across workers.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    parser: TagParser,
    require_internal_docs: bool,
}

impl SchemaValidator {
    pub fn new(config: &DoclintConfig) -> Self {
        Self {
            parser: TagParser::new(config),
            require_internal_docs: config.require_internal_docs,
        }
    }

    pub fn parser(&self) -> &TagParser {
        &self.parser
    }

    /// Validate every symbol of a unit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::core::Error::ContractViolation`] when the unit's symbol
    /// metadata is inconsistent with its text.
    pub fn validate_unit(&self, unit: &SourceUnit) -> Result<Vec<Diagnostic>> {
        let extraction = extract(unit)?;
        let mut diagnostics: Vec<Diagnostic> = extraction
            .orphan_errors
            .iter()
            .map(|e| extraction_diagnostic(&unit.path, e))
            .collect();

        for entry in &extraction.symbols {
            diagnostics.extend(self.validate_symbol(unit, entry));
        }
        Ok(diagnostics)
    }

    fn validate_symbol(&self, unit: &SourceUnit, entry: &SymbolBlock<'_>) -> Vec<Diagnostic> {
        let symbol = entry.symbol;
        match &entry.association {
            BlockAssociation::Missing => {
                missing_doc(&unit.path, symbol, self.require_internal_docs)
                    .into_iter()
                    .collect()
            }
            BlockAssociation::Malformed(error) => {
                vec![extraction_diagnostic(&unit.path, error).with_symbol(symbol.id())]
            }
            BlockAssociation::Found(raw) => {
                let parsed = self.parser.parse(raw);
                self.check_parsed(unit, symbol, &parsed)
            }
        }
    }

    /// Diagnostics for an already-parsed block: parse defects first, then
    /// schema findings.
    pub fn check_parsed(
        &self,
        unit: &SourceUnit,
        symbol: &Symbol,
        parsed: &ParsedBlock,
    ) -> Vec<Diagnostic> {
        let id = symbol.id();
        let mut diagnostics: Vec<Diagnostic> = parsed
            .errors
            .iter()
            .map(|e| {
                Diagnostic::new(e.code(), &unit.path, e.line, e.column, e.message.clone())
                    .with_symbol(id.clone())
            })
            .collect();
        diagnostics.extend(parsed.warnings.iter().map(|w| {
            Diagnostic::new(w.code, &unit.path, w.line, w.column, w.message.clone())
                .with_symbol(id.clone())
        }));
        diagnostics.extend(SymbolCheck::new(&unit.path, unit.language, symbol, &parsed.block).run());
        diagnostics
    }
}

fn extraction_diagnostic(file: &Path, error: &ExtractionError) -> Diagnostic {
    Diagnostic::new(error.code(), file, error.line, error.column, error.message.clone())
}

/// Validate one unit with a fresh validator.
pub fn validate_unit(unit: &SourceUnit, config: &DoclintConfig) -> Result<Vec<Diagnostic>> {
    SchemaValidator::new(config).validate_unit(unit)
}
