use crate::core::{TestFileKind, TestUnit};
use std::path::Path;

const INTEGRATION_DIRS: &[&str] = &["integration", "e2e", "flows"];
const INTEGRATION_MARKERS: &[&str] = &[".integration.", ".flow.", ".e2e."];

/// Resolve the kind of a test file.
///
/// An explicit kind wins. Otherwise a file under an `integration`/`e2e`/`flows`
/// directory, or named `*.integration.*`/`*.flow.*`/`*.e2e.*`, is an
/// integration test; anything else with a paired source is a unit test.
pub fn infer_kind(unit: &TestUnit, has_paired_source: bool) -> TestFileKind {
    if let Some(kind) = unit.kind {
        return kind;
    }
    if looks_like_integration(&unit.path) || !has_paired_source {
        TestFileKind::Integration
    } else {
        TestFileKind::Unit
    }
}

fn looks_like_integration(path: &Path) -> bool {
    let in_integration_dir = path
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .filter_map(|c| c.as_os_str().to_str())
        .any(|c| INTEGRATION_DIRS.contains(&c));
    let marked_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| INTEGRATION_MARKERS.iter().any(|m| name.contains(m)));
    in_integration_dir || marked_name
}
