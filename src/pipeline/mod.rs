//! Run orchestration.
//!
//! Every source unit goes through extract -> parse -> validate, every test
//! unit through the structure validator. Units share no state, so they are
//! drained on a fixed-size rayon pool and merged by the reporter, whose
//! ordering hides worker completion order.

mod cancel;

pub use cancel::CancellationToken;

use crate::cache::ResultCache;
use crate::config::DoclintConfig;
use crate::core::{Diagnostic, Error, Result, SourceUnit, TestUnit, ValidationReport};
use crate::report;
use crate::testing::TestStructureValidator;
use crate::validation::SchemaValidator;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span};

/// One queued piece of work
#[derive(Clone, Copy)]
enum Work<'a> {
    Source(&'a SourceUnit),
    Test(&'a TestUnit, Option<&'a SourceUnit>),
}

impl Work<'_> {
    fn path(&self) -> &Path {
        match self {
            Work::Source(unit) => &unit.path,
            Work::Test(unit, _) => &unit.path,
        }
    }
}

/// Result of one unit; `Skipped` when the run was cancelled first
enum Outcome {
    Checked(Vec<Diagnostic>),
    Skipped,
    Failed(PathBuf, Error),
}

/// Validation engine configured once per run.
pub struct Engine {
    config: DoclintConfig,
    schema: SchemaValidator,
    tests: TestStructureValidator,
    cache: Option<Arc<ResultCache>>,
}

impl Engine {
    /// Build an engine; a cache is created when `cache.enabled` is set.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or an unusable cache directory.
    pub fn new(config: DoclintConfig) -> Result<Self> {
        let cache = if config.cache.enabled {
            Some(Arc::new(ResultCache::new(&config)?))
        } else {
            None
        };
        Self::build(config, cache)
    }

    /// Build an engine that memoizes results in `cache`.
    pub fn with_cache(config: DoclintConfig, cache: Arc<ResultCache>) -> Result<Self> {
        Self::build(config, Some(cache))
    }

    fn build(config: DoclintConfig, cache: Option<Arc<ResultCache>>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            schema: SchemaValidator::new(&config),
            tests: TestStructureValidator::new(&config)?,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &DoclintConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_deref()
    }

    /// Validate every unit and assemble the report.
    ///
    /// Cancellation is checked before each unit; a cancelled run still
    /// returns a report, marked incomplete.
    ///
    /// # Errors
    ///
    /// Returns the contract violation of the smallest file path when the
    /// indexer metadata of any unit is inconsistent with its text.
    pub fn run(
        &self,
        sources: &[SourceUnit],
        tests: &[TestUnit],
        token: &CancellationToken,
    ) -> Result<ValidationReport> {
        let workers = self.config.parallel.effective_concurrency();
        let span = info_span!(
            "validation_run",
            sources = sources.len(),
            tests = tests.len(),
            workers = workers,
        );
        let _guard = span.enter();

        let by_path: HashMap<&Path, &SourceUnit> =
            sources.iter().map(|s| (s.path.as_path(), s)).collect();
        let work: Vec<Work<'_>> = sources
            .iter()
            .map(Work::Source)
            .chain(tests.iter().map(|t| {
                let paired = t
                    .paired_source
                    .as_deref()
                    .and_then(|p| by_path.get(p).copied());
                Work::Test(t, paired)
            }))
            .collect();

        let outcomes: Vec<Outcome> = if self.config.parallel.enabled && workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| Error::Concurrency(e.to_string()))?;
            pool.install(|| work.par_iter().map(|w| self.process(*w, token)).collect())
        } else {
            work.iter().map(|w| self.process(*w, token)).collect()
        };

        let mut diagnostics = Vec::new();
        let mut checked = 0;
        let mut skipped = 0;
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Checked(found) => {
                    checked += 1;
                    diagnostics.extend(found);
                }
                Outcome::Skipped => skipped += 1,
                Outcome::Failed(path, error) => failures.push((path, error)),
            }
        }

        if let Some((_, error)) = failures.into_iter().min_by(|a, b| a.0.cmp(&b.0)) {
            return Err(error);
        }

        if let Some(cache) = &self.cache {
            let stats = cache.stats();
            debug!(hits = stats.hits, misses = stats.misses, "cache usage");
        }
        let report = report::assemble(diagnostics, self.config.strict_mode, skipped == 0, checked);
        info!(
            units = checked,
            skipped = skipped,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation finished"
        );
        Ok(report)
    }

    fn process(&self, work: Work<'_>, token: &CancellationToken) -> Outcome {
        if token.is_cancelled() {
            return Outcome::Skipped;
        }
        debug!(file = %work.path().display(), "validating unit");

        let Some(cache) = &self.cache else {
            return self.check(work);
        };
        let (key, modified) = match work {
            Work::Source(unit) => (cache.source_key(unit), unit.modified),
            Work::Test(unit, paired) => (cache.test_key(unit, paired), None),
        };
        let key = match key {
            Ok(key) => key,
            Err(e) => {
                debug!(file = %work.path().display(), error = %e, "unit not cacheable");
                return self.check(work);
            }
        };

        if let Some(diagnostics) = cache.get(&key, modified) {
            debug!(file = %work.path().display(), "cache hit");
            return Outcome::Checked(diagnostics);
        }
        let outcome = self.check(work);
        if let Outcome::Checked(diagnostics) = &outcome {
            cache.put(key, diagnostics.clone());
        }
        outcome
    }

    fn check(&self, work: Work<'_>) -> Outcome {
        match work {
            Work::Source(unit) => match self.schema.validate_unit(unit) {
                Ok(diagnostics) => Outcome::Checked(diagnostics),
                Err(error) => Outcome::Failed(unit.path.clone(), error),
            },
            Work::Test(unit, paired) => Outcome::Checked(self.tests.validate(unit, paired)),
        }
    }
}

/// Validate units with a fresh engine and no cancellation.
pub fn run(
    config: DoclintConfig,
    sources: &[SourceUnit],
    tests: &[TestUnit],
) -> Result<ValidationReport> {
    Engine::new(config)?.run(sources, tests, &CancellationToken::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParallelConfig;
    use crate::core::{DiagnosticCode, Language, Symbol};
    use pretty_assertions::assert_eq;

    fn undocumented(path: &str, n: usize) -> SourceUnit {
        let text = (1..=n)
            .map(|i| format!("export function f{i}() {{}}\n"))
            .collect::<String>();
        (1..=n).fold(SourceUnit::new(path, text, Language::TypeScript), |unit, i| {
            unit.with_symbol(Symbol::function(format!("f{i}"), i).exported())
        })
    }

    fn corpus() -> Vec<SourceUnit> {
        (0..12).map(|i| undocumented(&format!("src/m{:02}.ts", 11 - i), 3)).collect()
    }

    fn config(workers: usize) -> DoclintConfig {
        DoclintConfig {
            parallel: ParallelConfig {
                enabled: workers > 1,
                max_concurrency: Some(workers),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_report_is_identical_across_worker_counts() {
        let sources = corpus();
        let sequential = run(config(1), &sources, &[]).unwrap();
        let parallel = run(config(4), &sources, &[]).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.units_checked, 12);
        assert_eq!(sequential.count_of(DiagnosticCode::MissingDoc), 36);
        assert_eq!(sequential.diagnostics[0].file, PathBuf::from("src/m00.ts"));
    }

    #[test]
    fn test_cancelled_run_is_incomplete() {
        let token = CancellationToken::new();
        token.cancel();
        let report = Engine::new(config(2))
            .unwrap()
            .run(&corpus(), &[], &token)
            .unwrap();
        assert!(!report.complete);
        assert!(!report.passed);
        assert_eq!(report.units_checked, 0);
    }

    #[test]
    fn test_contract_violation_of_smallest_path_wins() {
        let mut sources = corpus();
        for path in ["src/zz.ts", "src/aa.ts"] {
            sources.push(
                SourceUnit::new(path, "x\n", Language::TypeScript)
                    .with_symbol(Symbol::function("ghost", 40)),
            );
        }
        let err = run(config(4), &sources, &[]).unwrap_err();
        match err {
            Error::ContractViolation { file, .. } => assert_eq!(file, PathBuf::from("src/aa.ts")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_test_units_resolve_their_paired_source() {
        let source = SourceUnit::new("src/users.ts", "\n\n", Language::TypeScript)
            .with_symbol(Symbol::function("createUser", 1).exported())
            .with_symbol(Symbol::function("deleteUser", 2).exported());
        let test = TestUnit::new(
            "src/users.test.ts",
            "describe('createUser', () => {\n  it('returns {User} when valid', () => {});\n  it('throws {Error} when invalid', () => {});\n});\n",
            Language::TypeScript,
        )
        .paired_with("src/users.ts");

        let report = run(config(1), &[source], &[test]).unwrap();
        assert_eq!(report.count_of(DiagnosticCode::SuiteMissing), 1);
        assert_eq!(report.count_of(DiagnosticCode::FlowNameMismatch), 0);
    }

    #[test]
    fn test_cache_serves_repeat_runs() {
        let config = config(1);
        let cache = Arc::new(ResultCache::in_memory(&config));
        let engine = Engine::with_cache(config, Arc::clone(&cache)).unwrap();
        let sources = corpus();
        let token = CancellationToken::new();

        let first = engine.run(&sources, &[], &token).unwrap();
        let second = engine.run(&sources, &[], &token).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 12);
        assert_eq!(cache.stats().misses, 12);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DoclintConfig {
            max_tag_depth: Some(0),
            ..Default::default()
        };
        assert!(matches!(Engine::new(config), Err(Error::Configuration(_))));
    }
}
