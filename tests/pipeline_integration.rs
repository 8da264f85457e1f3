//! Engine behaviour across worker counts, cancellation and caching.

mod common;

use chrono::{Duration, Utc};
use common::{users_source, users_test};
use doclint::cache::ResultCache;
use doclint::config::{CacheConfig, DoclintConfig, ParallelConfig};
use doclint::core::{DiagnosticCode, Error, Language, SourceUnit, Symbol};
use doclint::pipeline::{CancellationToken, Engine};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn workload() -> Vec<SourceUnit> {
    let mut units: Vec<SourceUnit> = (0..20)
        .map(|i| {
            let mut unit = users_source();
            unit.path = format!("src/pkg{:02}/users.ts", (i * 7) % 20).into();
            if i % 3 == 0 {
                unit.text = unit.text.replace(" * @param id - Identifier\n", " * @param ident - Identifier\n");
            }
            unit
        })
        .collect();
    units.push(
        SourceUnit::new("src/bare.ts", "export const a = 1;\nexport function b() {}\n", Language::TypeScript)
            .with_symbol(Symbol::function("b", 2).exported()),
    );
    units
}

fn config_with_workers(workers: usize) -> DoclintConfig {
    DoclintConfig {
        parallel: ParallelConfig {
            enabled: workers > 1,
            max_concurrency: Some(workers),
        },
        ..Default::default()
    }
}

#[test]
fn test_report_does_not_depend_on_worker_count() {
    let sources = workload();
    let tests = vec![users_test()];
    let token = CancellationToken::new();

    let reports: Vec<_> = [1, 2, 8]
        .into_iter()
        .map(|workers| {
            Engine::new(config_with_workers(workers))
                .unwrap()
                .run(&sources, &tests, &token)
                .unwrap()
        })
        .collect();

    assert_eq!(reports[0], reports[1]);
    assert_eq!(reports[0], reports[2]);
    assert_eq!(reports[0].units_checked, 22);

    let files: Vec<_> = reports[0].diagnostics.iter().map(|d| d.file.clone()).collect();
    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted);
}

#[test]
fn test_scoped_defects_do_not_leak_between_units() {
    let report = doclint::pipeline::run(config_with_workers(4), &workload(), &[]).unwrap();
    // Units 0, 3, 6, ... rename `id` in two blocks: one unknown and one missing per block
    assert_eq!(report.count_of(DiagnosticCode::UnknownParam), 14);
    assert_eq!(report.count_of(DiagnosticCode::ParamMissing), 14);
    assert_eq!(report.count_of(DiagnosticCode::MissingDoc), 1);
}

#[test]
fn test_contract_violation_aborts_run() {
    let mut sources = workload();
    sources.push(
        SourceUnit::new("src/broken.ts", "\n", Language::TypeScript)
            .with_symbol(Symbol::function("ghost", 9).exported()),
    );
    let err = doclint::pipeline::run(config_with_workers(4), &sources, &[]).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(matches!(err, Error::ContractViolation { ref file, .. } if file.to_str() == Some("src/broken.ts")));
}

#[test]
fn test_cancelled_run_reports_incomplete() {
    let token = CancellationToken::new();
    token.cancel();
    let report = Engine::new(config_with_workers(2))
        .unwrap()
        .run(&workload(), &[users_test()], &token)
        .unwrap();
    assert!(!report.complete);
    assert!(!report.passed);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_disk_cache_is_reused_and_invalidated_by_mtime() {
    let dir = TempDir::new().unwrap();
    let config = DoclintConfig {
        cache: CacheConfig {
            enabled: true,
            dir: Some(dir.path().to_path_buf()),
        },
        ..config_with_workers(1)
    };
    let mut sources = vec![users_source()];
    sources[0].modified = Some(Utc::now() - Duration::minutes(5));
    let token = CancellationToken::new();

    let first = Engine::new(config.clone()).unwrap().run(&sources, &[], &token).unwrap();

    let cache = Arc::new(ResultCache::new(&config).unwrap());
    let engine = Engine::with_cache(config, Arc::clone(&cache)).unwrap();
    let second = engine.run(&sources, &[], &token).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().hits, 1);

    // Edited after the entry was written
    sources[0].modified = Some(Utc::now() + Duration::minutes(5));
    engine.run(&sources, &[], &token).unwrap();
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
}
