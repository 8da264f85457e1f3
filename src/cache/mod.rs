//! Optional memo of per-unit diagnostics.
//!
//! A unit is skipped when its text, its indexer metadata and every
//! diagnostic-affecting config option are unchanged since the entry was
//! written, and the entry is not older than the unit's modification time.

mod result_cache;

pub use result_cache::{CacheEntry, CacheKey, CacheStats, ResultCache};
