//! Parallelism configuration for the validation worker pool.
//!
//! Source units are independent, so the pipeline drains them on a fixed-size
//! rayon pool. This module controls the size of that pool.

use serde::{Deserialize, Serialize};

/// Default value for parallel processing enabled
fn default_enabled() -> bool {
    true
}

/// Configuration for parallel processing operations.
///
/// # Example
///
/// ```rust
/// use doclint::config::ParallelConfig;
///
/// let config = ParallelConfig {
///     enabled: true,
///     max_concurrency: Some(4),
/// };
/// assert_eq!(config.effective_concurrency(), 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Enable parallel processing (default: true)
    ///
    /// When disabled, units are validated sequentially on the calling thread.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Worker count (default: available CPU cores)
    #[serde(default, alias = "maxConcurrency")]
    pub max_concurrency: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_concurrency: None,
        }
    }
}

impl ParallelConfig {
    /// Create a config with parallel processing disabled.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Get the effective worker count.
    ///
    /// Returns the configured max_concurrency, or the number of
    /// available CPU cores if not specified.
    pub fn effective_concurrency(&self) -> usize {
        if !self.enabled {
            return 1;
        }
        self.max_concurrency.unwrap_or_else(num_cpus)
    }
}

/// Returns the number of available CPU cores.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_config_default() {
        let config = ParallelConfig::default();
        assert!(config.enabled);
        assert!(config.max_concurrency.is_none());
        assert!(config.effective_concurrency() >= 1);
    }

    #[test]
    fn test_sequential_uses_single_worker() {
        let config = ParallelConfig {
            max_concurrency: Some(8),
            ..ParallelConfig::sequential()
        };
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_parallel_config_toml_alias() {
        let config: ParallelConfig = toml::from_str("maxConcurrency = 3").unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_concurrency, Some(3));
    }
}
