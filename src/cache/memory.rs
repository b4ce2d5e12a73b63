//! In-process cache, lost on restart.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{AnalysisCache, CacheError, CacheResult};
use crate::analyzer::MealAnalysis;

/// `None` expiry means the TTL ran past what `Instant` can represent
type Slot = (MealAnalysis, Option<Instant>);

fn is_live(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.map_or(true, |at| now < at)
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Slot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalysisCache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<MealAnalysis>> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        let expired = match entries.get(key) {
            Some((value, expires_at)) if is_live(*expires_at, Instant::now()) => {
                return Ok(Some(value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, value: &MealAnalysis, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), (value.clone(), Instant::now().checked_add(ttl)));
        Ok(())
    }

    fn evict(&self, key: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn purge_expired(&self) -> CacheResult<usize> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| is_live(*expires_at, now));
        Ok(before - entries.len())
    }
}
