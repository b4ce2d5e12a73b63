//! Cache persisted in the diary database's `analysis_cache` table.

use std::time::Duration;

use rusqlite::params;

use super::{AnalysisCache, CacheResult};
use crate::analyzer::MealAnalysis;
use crate::db::{Database, DbError};

#[derive(Clone)]
pub struct SqliteCache {
    database: Database,
}

impl SqliteCache {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl AnalysisCache for SqliteCache {
    fn get(&self, key: &str) -> CacheResult<Option<MealAnalysis>> {
        let row = self.database.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT payload, expires_at_ms FROM analysis_cache WHERE cache_key = ?1",
                [key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            );
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(DbError::from(e)),
            }
        })?;

        match row {
            Some((_, expires_at_ms)) if now_ms() >= expires_at_ms => {
                self.evict(key)?;
                Ok(None)
            }
            Some((payload, _)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &MealAnalysis, ttl: Duration) -> CacheResult<()> {
        let payload = serde_json::to_string(value)?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = now_ms().saturating_add(ttl_ms);

        self.database.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO analysis_cache (cache_key, payload, expires_at_ms)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(cache_key) DO UPDATE SET
                    payload = excluded.payload,
                    expires_at_ms = excluded.expires_at_ms,
                    created_at = datetime('now')
                "#,
                params![key, payload, expires_at_ms],
            )?;
            Ok(())
        })?;
        Ok(())
    }

    fn evict(&self, key: &str) -> CacheResult<bool> {
        let rows = self.database.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM analysis_cache WHERE cache_key = ?1", [key])?)
        })?;
        Ok(rows > 0)
    }

    fn purge_expired(&self) -> CacheResult<usize> {
        let now = now_ms();
        let rows = self.database.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM analysis_cache WHERE expires_at_ms <= ?1", [now])?)
        })?;
        Ok(rows)
    }
}
