//! Diary entries
//!
//! The flat, mixed collection the history and insight views read.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{FoodEntry, WellnessEntry};

/// A single diary record: a meal or a wellness check-in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiaryEntry {
    Food(FoodEntry),
    Wellness(WellnessEntry),
}

impl DiaryEntry {
    pub fn id(&self) -> i64 {
        match self {
            DiaryEntry::Food(e) => e.id,
            DiaryEntry::Wellness(e) => e.id,
        }
    }

    /// Raw timestamp string as stored
    pub fn date(&self) -> &str {
        match self {
            DiaryEntry::Food(e) => &e.date,
            DiaryEntry::Wellness(e) => &e.date,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DiaryEntry::Food(_) => "food",
            DiaryEntry::Wellness(_) => "wellness",
        }
    }

    /// Load every food and wellness entry. Food entries come first, each
    /// kind in insertion order.
    pub fn load_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let foods = FoodEntry::list_all(conn)?;
        let checkins = WellnessEntry::list_all(conn)?;

        let mut entries = Vec::with_capacity(foods.len() + checkins.len());
        entries.extend(foods.into_iter().map(DiaryEntry::Food));
        entries.extend(checkins.into_iter().map(DiaryEntry::Wellness));
        Ok(entries)
    }
}

impl From<FoodEntry> for DiaryEntry {
    fn from(entry: FoodEntry) -> Self {
        DiaryEntry::Food(entry)
    }
}

impl From<WellnessEntry> for DiaryEntry {
    fn from(entry: WellnessEntry) -> Self {
        DiaryEntry::Wellness(entry)
    }
}
