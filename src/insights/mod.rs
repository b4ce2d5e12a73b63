//! Diary insights
//!
//! Pure views over a flat list of [`DiaryEntry`](crate::models::DiaryEntry)
//! values: the per-day history and the sensitivity correlation table. Neither
//! touches storage; entries whose timestamp cannot be read are left out and
//! reported back as [`SkippedEntry`] values.

pub mod clock;
pub mod correlation;
pub mod history;

use serde::Serialize;

use crate::models::DiaryEntry;

pub use clock::{DayClock, OffsetError, TimestampError};
pub use correlation::{
    correlate, correlate_with_window, SensitivityCorrelation, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
pub use history::{group_by_day, DayBucket, FoodSummary, WellnessSummary};

/// An entry left out of an aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub kind: &'static str,
    pub id: i64,
    pub date: String,
    pub reason: String,
}

impl SkippedEntry {
    fn new(entry: &DiaryEntry, error: &TimestampError) -> Self {
        tracing::debug!(kind = entry.kind(), id = entry.id(), %error, "Skipping diary entry");
        Self {
            kind: entry.kind(),
            id: entry.id(),
            date: entry.date().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Result of an aggregation pass plus the entries it could not use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregated<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedEntry>,
}

impl<T> Aggregated<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether a check-in at `candidate` replaces the one held for its day.
/// Strictly later wins; on a tie the first one seen is kept.
pub(crate) fn supersedes(
    candidate: &chrono::DateTime<chrono::FixedOffset>,
    current: Option<&chrono::DateTime<chrono::FixedOffset>>,
) -> bool {
    current.map_or(true, |held| candidate > held)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{
        DiaryEntry, EnergyLevel, FoodEntry, Ingredients, StomachRating, WellnessEntry,
    };

    pub fn food(id: i64, date: &str, name: &str, tags: &[&str]) -> DiaryEntry {
        DiaryEntry::Food(FoodEntry {
            id,
            date: date.to_string(),
            food: name.to_string(),
            ingredients: Ingredients::List(vec![name.to_lowercase()]),
            sensitivities: tags.iter().map(|t| t.to_string()).collect(),
            meal_type: None,
            description: None,
            created_at: String::new(),
            updated_at: String::new(),
        })
    }

    pub fn wellness(id: i64, date: &str, stomach: StomachRating) -> DiaryEntry {
        DiaryEntry::Wellness(WellnessEntry {
            id,
            date: date.to_string(),
            stomach,
            energy: EnergyLevel::Moderate,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        })
    }
}
