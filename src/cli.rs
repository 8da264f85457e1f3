use crate::config::{self, DoclintConfig};
use crate::core::{Error, Language, Result, SourceUnit, TestUnit};
use crate::report;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "doclint")]
#[command(about = "Doc-comment schema and test layout checker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON manifest listing `sources` and `tests` units
    pub manifest: PathBuf,

    /// Configuration file (default: nearest .doclint.toml above the manifest)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Treat every warning as an error
    #[arg(long)]
    pub strict: bool,

    /// Number of worker threads (1 disables parallel validation)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Persist results under this directory and reuse them on later runs
    #[arg(long = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

impl From<OutputFormat> for report::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => report::OutputFormat::Json,
            OutputFormat::Terminal => report::OutputFormat::Terminal,
        }
    }
}

/// Units handed over by the indexer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sources: Vec<SourceUnit>,
    #[serde(default)]
    pub tests: Vec<TestUnit>,
}

impl Manifest {
    /// Read a manifest; units without a `language` get one from their path's
    /// extension.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(contents)?;
        for list in ["sources", "tests"] {
            let Some(units) = value.get_mut(list).and_then(Value::as_array_mut) else {
                continue;
            };
            for unit in units.iter_mut().filter_map(Value::as_object_mut) {
                if unit.contains_key("language") {
                    continue;
                }
                let inferred = unit
                    .get("path")
                    .and_then(Value::as_str)
                    .and_then(|p| Path::new(p).extension())
                    .and_then(|ext| ext.to_str())
                    .and_then(Language::from_extension);
                // Unknown extensions stay unset and fail deserialization below
                if let Some(language) = inferred {
                    unit.insert("language".to_string(), serde_json::to_value(language)?);
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl Cli {
    /// Resolve the effective configuration: file first, then flag overrides.
    ///
    /// An explicit `--config` that cannot be read is an error; a discovered
    /// file that cannot be read falls back to defaults.
    pub fn resolve_config(&self) -> Result<DoclintConfig> {
        let mut config = match &self.config {
            Some(path) => config::load_config_from_path(path)?,
            None => {
                let start = self
                    .manifest
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let start = fs::canonicalize(&start).unwrap_or(start);
                config::load_config_from(&start)
            }
        };

        if self.strict {
            config.strict_mode = true;
        }
        match self.jobs {
            Some(0) => {
                return Err(Error::Configuration(
                    "--jobs must be at least 1".to_string(),
                ))
            }
            Some(1) => config.parallel.enabled = false,
            Some(n) => {
                config.parallel.enabled = true;
                config.parallel.max_concurrency = Some(n);
            }
            None => {}
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.enabled = true;
            config.cache.dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
