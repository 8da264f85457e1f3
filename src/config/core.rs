use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::parallel::ParallelConfig;
use crate::core::{Error, Result};

/// Nested-field marker convention used when rendering and expected when parsing.
///
/// Both conventions are always accepted by the parser; lines written in the
/// other convention produce a `MARKER_STYLE` warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerConvention {
    /// `- name: type - description`, alternating `-` / `+` by depth
    #[default]
    DashPlus,
    /// `- {type} name - description`, alternating `-` / `+` by depth
    BraceTyped,
}

/// Root configuration structure for doclint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoclintConfig {
    /// Promote every warning to an error
    #[serde(default, alias = "strictMode")]
    pub strict_mode: bool,

    /// Require docs (as warnings) on internal symbols flagged by the indexer
    #[serde(default = "default_true", alias = "requireInternalDocs")]
    pub require_internal_docs: bool,

    /// Expected nested-field marker convention
    #[serde(default, alias = "markerConvention")]
    pub marker_convention: MarkerConvention,

    /// Report `COVERAGE_GAP` as an error instead of a warning
    #[serde(default, alias = "testCoverageGapIsError")]
    pub test_coverage_gap_is_error: bool,

    /// Deepest nested-field level accepted without `DEPTH_EXCEEDED`
    #[serde(default, alias = "maxTagDepth")]
    pub max_tag_depth: Option<usize>,

    /// Tags accepted and ignored by the parser
    #[serde(default = "default_extra_tags", alias = "extraTags")]
    pub extra_tags: Vec<String>,

    /// Worker pool configuration
    #[serde(default)]
    pub parallel: ParallelConfig,

    /// Test file layout conventions
    #[serde(default)]
    pub tests: TestLayoutConfig,

    /// Result cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for DoclintConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            require_internal_docs: true,
            marker_convention: MarkerConvention::default(),
            test_coverage_gap_is_error: false,
            max_tag_depth: None,
            extra_tags: default_extra_tags(),
            parallel: ParallelConfig::default(),
            tests: TestLayoutConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl DoclintConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_tag_depth == Some(0) {
            return Err(Error::Configuration(
                "max_tag_depth must be at least 1".to_string(),
            ));
        }
        if self.parallel.max_concurrency == Some(0) {
            return Err(Error::Configuration(
                "parallel.max_concurrency must be at least 1".to_string(),
            ));
        }
        self.tests.flow_file_regex()?;
        Ok(())
    }

    pub fn is_extra_tag(&self, tag: &str) -> bool {
        self.extra_tags.iter().any(|t| t == tag)
    }

    /// Stable digest input covering every option that changes diagnostics.
    ///
    /// Parallelism and cache settings are excluded since they never affect
    /// the verdict for a unit.
    pub fn fingerprint(&self) -> String {
        format!(
            "strict={};internal={};markers={:?};gap={};depth={:?};extra={};db={};neg={};flow={}",
            self.strict_mode,
            self.require_internal_docs,
            self.marker_convention,
            self.test_coverage_gap_is_error,
            self.max_tag_depth,
            self.extra_tags.join(","),
            self.tests.db_setup_keywords.join(","),
            self.tests.negative_case_keywords.join(","),
            self.tests.flow_file_pattern,
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_extra_tags() -> Vec<String> {
    ["deprecated", "see", "since", "internal", "example"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Conventions the test structure validator checks against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestLayoutConfig {
    /// Words that mark a top-level hook or declaration as database setup
    #[serde(default = "default_db_keywords", alias = "dbSetupKeywords")]
    pub db_setup_keywords: Vec<String>,

    /// Words that mark an integration case as a negative path
    #[serde(default = "default_negative_keywords", alias = "negativeCaseKeywords")]
    pub negative_case_keywords: Vec<String>,

    /// Regex an integration test file name must match
    #[serde(default = "default_flow_pattern", alias = "flowFilePattern")]
    pub flow_file_pattern: String,
}

impl Default for TestLayoutConfig {
    fn default() -> Self {
        Self {
            db_setup_keywords: default_db_keywords(),
            negative_case_keywords: default_negative_keywords(),
            flow_file_pattern: default_flow_pattern(),
        }
    }
}

impl TestLayoutConfig {
    pub fn flow_file_regex(&self) -> Result<Regex> {
        Regex::new(&self.flow_file_pattern).map_err(|e| {
            Error::Configuration(format!(
                "invalid tests.flow_file_pattern '{}': {}",
                self.flow_file_pattern, e
            ))
        })
    }
}

fn default_db_keywords() -> Vec<String> {
    [
        "db",
        "database",
        "prisma",
        "knex",
        "mongoose",
        "sequelize",
        "typeorm",
        "datasource",
        "migrate",
        "truncate",
        "seed",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_negative_keywords() -> Vec<String> {
    [
        "throws",
        "fails",
        "rejects",
        "error",
        "invalid",
        "denied",
        "unauthorized",
        "forbidden",
        "not found",
        "cannot",
        "missing",
        "expired",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_flow_pattern() -> String {
    r"^[a-z0-9]+(?:-[a-z0-9]+)*\.(?:flow|integration)\.(?:test|spec)\.[a-z]+$".to_string()
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CacheConfig {
    /// Skip units whose content and signatures are unchanged
    #[serde(default)]
    pub enabled: bool,

    /// Directory for persisted entries; in-memory only when absent
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
