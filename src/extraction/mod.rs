//! Block extraction: associate each symbol with the doc block directly above it.
//!
//! A block belongs to a symbol only when nothing but blank lines separates the
//! closing delimiter from the declaration. Blocks are never shared: the scan
//! for a symbol stops at the previous symbol's declaration line.
//!
//! # Usage
//!
//! ```rust
//! use doclint::core::{Language, SourceUnit, Symbol};
//! use doclint::extraction::{extract, BlockAssociation};
//!
//! let unit = SourceUnit::new(
//!     "src/ids.ts",
//!     "/** Returns the next id. */\nexport function nextId() {}\n",
//!     Language::TypeScript,
//! )
//! .with_symbol(Symbol::function("nextId", 2).exported());
//!
//! let extraction = extract(&unit).unwrap();
//! assert!(matches!(extraction.symbols[0].association, BlockAssociation::Found(_)));
//! ```

mod scanner;

pub use scanner::{scan_blocks, strip_leader, Delimiters, InteriorLine, RawBlock, ScanResult, UnclosedBlock};

use crate::core::{Error, ExtractionError, Result, SourceUnit, Symbol};
use scanner::Lines;
use std::collections::BTreeSet;

/// Outcome of looking for a symbol's doc block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockAssociation {
    Found(RawBlock),
    /// No contiguous block; drives `MISSING_DOC`
    Missing,
    /// The block intended for this symbol never closed
    Malformed(ExtractionError),
}

#[derive(Debug, Clone)]
pub struct SymbolBlock<'a> {
    pub symbol: &'a Symbol,
    pub association: BlockAssociation,
}

/// Per-unit extraction result.
#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    /// One entry per symbol, in the unit's symbol order
    pub symbols: Vec<SymbolBlock<'a>>,
    /// Unclosed blocks that ran into end-of-file without reaching a symbol
    pub orphan_errors: Vec<ExtractionError>,
}

/// Extract and associate doc blocks for every symbol of `unit`.
///
/// # Errors
///
/// Returns [`Error::ContractViolation`] when a symbol's declaration line lies
/// outside the file.
pub fn extract(unit: &SourceUnit) -> Result<Extraction<'_>> {
    check_declaration_lines(unit)?;

    let stop_lines: BTreeSet<usize> = unit.symbols.iter().map(|s| s.declaration_line).collect();
    let delimiters = Delimiters::for_language(unit.language);
    let scan = scan_blocks(&unit.text, delimiters, &stop_lines);
    let lines = Lines::new(&unit.text);

    let symbols = unit
        .symbols
        .iter()
        .map(|symbol| SymbolBlock {
            symbol,
            association: associate(symbol, &stop_lines, &scan, &lines),
        })
        .collect();

    let orphan_errors = scan
        .unclosed
        .iter()
        .filter(|u| u.stopped_at.is_none())
        .map(|u| u.error.clone())
        .collect();

    Ok(Extraction {
        symbols,
        orphan_errors,
    })
}

fn check_declaration_lines(unit: &SourceUnit) -> Result<()> {
    let line_count = unit.line_count();
    match unit
        .symbols
        .iter()
        .find(|s| s.declaration_line == 0 || s.declaration_line > line_count)
    {
        Some(symbol) => Err(Error::contract(
            &unit.path,
            format!(
                "symbol `{}` declared on line {} but the file has {} lines",
                symbol.name, symbol.declaration_line, line_count
            ),
        )),
        None => Ok(()),
    }
}

fn associate(
    symbol: &Symbol,
    stop_lines: &BTreeSet<usize>,
    scan: &ScanResult,
    lines: &Lines<'_>,
) -> BlockAssociation {
    let decl = symbol.declaration_line;

    if let Some(unclosed) = scan.unclosed.iter().find(|u| u.stopped_at == Some(decl)) {
        return BlockAssociation::Malformed(unclosed.error.clone());
    }

    // Nearest declaration strictly above this one bounds the search
    let boundary = stop_lines.range(..decl).next_back().copied().unwrap_or(0);

    // `/** Brief. */ export function f()` on a single line
    if let Some(block) = scan
        .blocks
        .iter()
        .find(|b| b.end_line == decl && b.start_line > boundary)
    {
        return BlockAssociation::Found(block.clone());
    }

    let nearest = (boundary + 1..decl).rev().find(|&n| !lines.is_blank(n));
    nearest
        .and_then(|end| {
            scan.blocks
                .iter()
                .find(|b| b.end_line == end && b.start_line > boundary)
        })
        .map_or(BlockAssociation::Missing, |block| {
            BlockAssociation::Found(block.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use indoc::indoc;

    fn unit(text: &str, symbols: Vec<Symbol>) -> SourceUnit {
        let mut unit = SourceUnit::new("src/users.ts", text, Language::TypeScript);
        unit.symbols = symbols;
        unit
    }

    #[test]
    fn test_block_separated_by_blank_lines_is_associated() {
        let text = indoc! {"
            /**
             * Creates a user.
             */


            export function createUser() {}
        "};
        let unit = unit(text, vec![Symbol::function("createUser", 6)]);
        let extraction = extract(&unit).unwrap();
        match &extraction.symbols[0].association {
            BlockAssociation::Found(block) => assert_eq!(block.start_line, 1),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_code_between_block_and_symbol_breaks_association() {
        let text = indoc! {"
            /** Creates a user. */
            const LIMIT = 3;
            export function createUser() {}
        "};
        let unit = unit(text, vec![Symbol::function("createUser", 3)]);
        let extraction = extract(&unit).unwrap();
        assert_eq!(extraction.symbols[0].association, BlockAssociation::Missing);
    }

    #[test]
    fn test_block_is_not_shared_across_symbols() {
        let text = indoc! {"
            /** First. */
            export function first() {}
            export function second() {}
        "};
        let unit = unit(
            text,
            vec![Symbol::function("first", 2), Symbol::function("second", 3)],
        );
        let extraction = extract(&unit).unwrap();
        assert!(matches!(extraction.symbols[0].association, BlockAssociation::Found(_)));
        assert_eq!(extraction.symbols[1].association, BlockAssociation::Missing);
    }

    #[test]
    fn test_malformed_block_is_scoped_to_next_symbol() {
        let text = indoc! {"
            /**
             * Never closed
            export function broken() {}

            /** Fine. */
            export function fine() {}
        "};
        let unit = unit(
            text,
            vec![Symbol::function("broken", 3), Symbol::function("fine", 6)],
        );
        let extraction = extract(&unit).unwrap();
        assert!(matches!(
            extraction.symbols[0].association,
            BlockAssociation::Malformed(_)
        ));
        assert!(matches!(extraction.symbols[1].association, BlockAssociation::Found(_)));
        assert!(extraction.orphan_errors.is_empty());
    }

    #[test]
    fn test_unclosed_block_after_last_symbol_is_orphan() {
        let text = "export function a() {}\n/**\n * trailing\n";
        let unit = unit(text, vec![Symbol::function("a", 1)]);
        let extraction = extract(&unit).unwrap();
        assert_eq!(extraction.orphan_errors.len(), 1);
        assert_eq!(extraction.orphan_errors[0].line, 2);
    }

    #[test]
    fn test_same_line_block() {
        let text = "/** Adds. */ export function add() {}\n";
        let unit = unit(text, vec![Symbol::function("add", 1)]);
        let extraction = extract(&unit).unwrap();
        assert!(matches!(extraction.symbols[0].association, BlockAssociation::Found(_)));
    }

    #[test]
    fn test_declaration_outside_file_is_contract_violation() {
        let unit = unit("export function a() {}\n", vec![Symbol::function("a", 40)]);
        let err = extract(&unit).unwrap_err();
        assert!(err.is_contract_violation());

        let unit = self::unit("export function a() {}\n", vec![Symbol::function("a", 0)]);
        assert!(extract(&unit).is_err());
    }
}
