//! Test Structure Validator.
//!
//! Test files are not parsed as a language. A lightweight outline scanner
//! splits them into top-level statements (imports, setup, suites, stray
//! cases) and the layout rules are checked against that outline:
//!
//! - unit files follow `IMPORTS -> DB_SETUP -> FILE_SETUP -> SUITES`, name
//!   one suite per exported function of the paired source, and cover both a
//!   `returns {T} when ...` and a `throws {E} when ...` case;
//! - integration files follow the flow naming convention and cover one
//!   happy-path and one negative-path case per flow.

mod kind;
mod outline;
mod structure;

pub use kind::infer_kind;
pub use outline::{outline, Case, Outline, Statement, StatementKind};
pub use structure::TestStructureValidator;
