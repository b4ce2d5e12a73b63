//! Analysis cache
//!
//! Model results are cached per meal description so re-analysing the same
//! text does not call the model again. The cache is injected wherever it is
//! needed; nothing here is global.

mod memory;
mod sqlite;

use std::time::Duration;

use thiserror::Error;

use crate::analyzer::MealAnalysis;
use crate::db::DbError;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Cached payload could not be decoded: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store for analysis results with per-entry expiry
pub trait AnalysisCache: Send + Sync {
    /// A live entry for `key`; expired entries read as misses
    fn get(&self, key: &str) -> CacheResult<Option<MealAnalysis>>;

    /// Store `value`, replacing any entry for `key`, valid for `ttl`
    fn put(&self, key: &str, value: &MealAnalysis, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`; true if an entry was present
    fn evict(&self, key: &str) -> CacheResult<bool>;

    /// Drop every expired entry, returning how many were removed
    fn purge_expired(&self) -> CacheResult<usize>;
}

/// Cache key for a meal description and optional image reference.
///
/// Case and whitespace differences in the description map to the same key.
pub fn cache_key(description: &str, image: Option<&str>) -> String {
    let text = description
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    match image.map(str::trim).filter(|s| !s.is_empty()) {
        Some(image) => format!("{}|image:{}", text, image),
        None => text,
    }
}
