use crate::config::DoclintConfig;
use crate::core::{Diagnostic, Error, Result, SourceUnit, TestUnit};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hex SHA-256 digest identifying one unit's inputs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cached diagnostics for one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Diagnostics before strict-mode promotion
    pub diagnostics: Vec<Diagnostic>,
    /// When the entry was computed
    pub timestamp: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Content-addressed memo of per-unit diagnostics.
///
/// Shared across worker threads. Entries live in memory and, when a cache
/// directory is configured, also as one JSON file per key.
pub struct ResultCache {
    memory: DashMap<CacheKey, CacheEntry>,
    dir: Option<PathBuf>,
    fingerprint: String,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResultCache {
    /// Create a cache for runs under `config`.
    ///
    /// # Errors
    ///
    /// Fails when the configured cache directory cannot be created.
    pub fn new(config: &DoclintConfig) -> Result<Self> {
        if let Some(dir) = &config.cache.dir {
            fs::create_dir_all(dir).map_err(|e| {
                Error::Cache(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(Self {
            dir: config.cache.dir.clone(),
            ..Self::in_memory(config)
        })
    }

    /// A cache that never touches the filesystem
    pub fn in_memory(config: &DoclintConfig) -> Self {
        Self {
            memory: DashMap::new(),
            dir: None,
            fingerprint: config.fingerprint(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn source_key(&self, unit: &SourceUnit) -> Result<CacheKey> {
        let mut hasher = self.hasher("source", &unit.path);
        hasher.update(unit.text.as_bytes());
        hasher.update(b"\0");
        hasher.update(serde_json::to_vec(&unit.symbols)?);
        Ok(CacheKey(format!("{:x}", hasher.finalize())))
    }

    /// Test diagnostics also depend on the exported names of the paired source.
    pub fn test_key(&self, unit: &TestUnit, paired: Option<&SourceUnit>) -> Result<CacheKey> {
        let mut hasher = self.hasher("test", &unit.path);
        hasher.update(unit.text.as_bytes());
        hasher.update(b"\0");
        hasher.update(serde_json::to_vec(&unit.kind)?);
        if let Some(source) = paired {
            hasher.update(source.path.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(serde_json::to_vec(&source.symbols)?);
        }
        Ok(CacheKey(format!("{:x}", hasher.finalize())))
    }

    fn hasher(&self, domain: &str, path: &Path) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.fingerprint.as_bytes());
        hasher.update(b"\0");
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher
    }

    /// Look up a key; an entry older than `modified` is stale.
    pub fn get(&self, key: &CacheKey, modified: Option<DateTime<Utc>>) -> Option<Vec<Diagnostic>> {
        let fresh = |entry: &CacheEntry| modified.is_none_or(|m| entry.timestamp >= m);

        if let Some(entry) = self.memory.get(key) {
            if fresh(entry.value()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = key.as_str(), "cache hit (memory)");
                return Some(entry.diagnostics.clone());
            }
        }

        if let Some(entry) = self.load(key) {
            if fresh(&entry) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = key.as_str(), "cache hit (disk)");
                let diagnostics = entry.diagnostics.clone();
                self.memory.insert(key.clone(), entry);
                return Some(diagnostics);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store diagnostics for a key. Persistence failures are logged, never fatal.
    pub fn put(&self, key: CacheKey, diagnostics: Vec<Diagnostic>) {
        let entry = CacheEntry {
            diagnostics,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.persist(&key, &entry) {
            tracing::warn!(key = key.as_str(), error = %e, "failed to persist cache entry");
        }
        self.memory.insert(key, entry);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.memory.len(),
        }
    }

    /// Drop every in-memory entry and any persisted files.
    pub fn clear(&self) -> Result<()> {
        self.memory.clear();
        if let Some(dir) = &self.dir {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }

    fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", key.as_str())))
    }

    fn load(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key)?;
        let data = fs::read(&path).ok()?;
        match serde_json::from_slice(&data) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    fn persist(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        let Some(path) = self.entry_path(key) else {
            return Ok(());
        };
        let data = serde_json::to_vec(entry)?;
        fs::write(&path, data)?;
        Ok(())
    }
}
