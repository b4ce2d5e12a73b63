//! Sensitivity MCP Tools
//!
//! The curated tag list and the sensitivity correlation report.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::MAX_WINDOW_DAYS;
use crate::db::Database;
use crate::insights::{correlate_with_window, DayClock, SensitivityCorrelation, SkippedEntry};
use crate::models::{DiaryEntry, Sensitivity, CURATED_SENSITIVITIES};

use super::entries::load_entries;

/// A tag seen in the diary
#[derive(Debug, Serialize)]
pub struct TagUsage {
    pub tag: String,
    pub entries: u32,
    pub curated: bool,
}

/// Response for list_sensitivities
#[derive(Debug, Serialize)]
pub struct SensitivityListResponse {
    pub curated: Vec<&'static str>,
    /// Tags on logged meals, most used first
    pub in_use: Vec<TagUsage>,
}

/// Response for get_sensitivity_insights
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub window_days: u32,
    pub food_entries: usize,
    pub wellness_entries: usize,
    pub correlations: Vec<SensitivityCorrelation>,
    pub skipped_entries: Vec<SkippedEntry>,
}

/// Curated tags plus every tag already used in the diary
pub fn list_sensitivities(db: &Database) -> Result<SensitivityListResponse, String> {
    let mut counts: BTreeMap<Sensitivity, u32> = BTreeMap::new();
    for entry in load_entries(db)? {
        if let DiaryEntry::Food(food) = entry {
            for tag in Sensitivity::parse_all(&food.sensitivities) {
                *counts.entry(tag).or_default() += 1;
            }
        }
    }

    let mut in_use: Vec<TagUsage> = counts
        .into_iter()
        .map(|(tag, entries)| TagUsage {
            curated: tag.is_curated(),
            tag: tag.into(),
            entries,
        })
        .collect();
    in_use.sort_by(|a, b| b.entries.cmp(&a.entries));

    Ok(SensitivityListResponse {
        curated: CURATED_SENSITIVITIES.to_vec(),
        in_use,
    })
}

/// Correlate sensitivities with poor stomach days.
///
/// `window_days` overrides the configured window for this call.
pub fn get_sensitivity_insights(
    db: &Database,
    clock: &DayClock,
    default_window: u32,
    window_days: Option<u32>,
) -> Result<InsightsResponse, String> {
    let window_days = match window_days {
        Some(days) if (1..=MAX_WINDOW_DAYS).contains(&days) => days,
        Some(_) => return Err(format!("window_days must be between 1 and {}", MAX_WINDOW_DAYS)),
        None => default_window,
    };

    let entries = load_entries(db)?;
    let food_entries = entries.iter().filter(|e| e.kind() == "food").count();
    let wellness_entries = entries.len() - food_entries;

    let result = correlate_with_window(&entries, clock, window_days);
    tracing::info!(
        window_days,
        tags = result.items.len(),
        skipped = result.skipped.len(),
        "Computed sensitivity insights"
    );

    Ok(InsightsResponse {
        window_days,
        food_entries,
        wellness_entries,
        correlations: result.items,
        skipped_entries: result.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EnergyLevel, FoodEntry, FoodEntryCreate, Ingredients, StomachRating, WellnessEntry,
        WellnessEntryCreate,
    };

    fn setup() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_migrated(dir.path().join("fwd.db")).unwrap();
        (dir, db)
    }

    fn add_food(db: &Database, date: &str, tags: &[&str]) {
        let conn = db.get_conn().unwrap();
        FoodEntry::create(
            &conn,
            &FoodEntryCreate {
                date: date.to_string(),
                food: "Meal".to_string(),
                ingredients: Ingredients::default(),
                sensitivities: tags.iter().map(|t| t.to_string()).collect(),
                meal_type: None,
                description: None,
            },
        )
        .unwrap();
    }

    fn add_checkin(db: &Database, date: &str, stomach: StomachRating) {
        let conn = db.get_conn().unwrap();
        WellnessEntry::create(
            &conn,
            &WellnessEntryCreate {
                date: date.to_string(),
                stomach,
                energy: EnergyLevel::Moderate,
                notes: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_insights_from_database() {
        let (_dir, db) = setup();
        add_food(&db, "2025-01-01T12:00:00Z", &["dairy"]);
        add_food(&db, "2025-01-04T12:00:00Z", &["dairy", "gluten"]);
        add_checkin(&db, "2025-01-02T20:00:00Z", StomachRating::Poor);
        add_checkin(&db, "2025-01-07T20:00:00Z", StomachRating::VeryPoor);

        let clock = DayClock::utc();
        let insights = get_sensitivity_insights(&db, &clock, 2, None).unwrap();
        assert_eq!(insights.window_days, 2);
        assert_eq!(insights.food_entries, 2);
        assert_eq!(insights.wellness_entries, 2);

        let dairy = &insights.correlations[0];
        assert_eq!(dairy.sensitivity.as_str(), "dairy");
        assert_eq!(dairy.total_occurrences, 2);
        assert_eq!(dairy.low_score_count, 1);
        assert_eq!(dairy.percentage, 50);

        // A three-day window reaches the 7th from the 4th
        let wider = get_sensitivity_insights(&db, &clock, 2, Some(3)).unwrap();
        assert_eq!(wider.correlations[0].percentage, 100);
    }

    #[test]
    fn test_insights_rejects_bad_window() {
        let (_dir, db) = setup();
        let clock = DayClock::utc();
        assert!(get_sensitivity_insights(&db, &clock, 2, Some(0)).is_err());
        assert!(get_sensitivity_insights(&db, &clock, 2, Some(MAX_WINDOW_DAYS + 1)).is_err());
    }

    #[test]
    fn test_list_sensitivities_counts_usage() {
        let (_dir, db) = setup();
        add_food(&db, "2025-01-01T12:00:00Z", &["dairy", "mango"]);
        add_food(&db, "2025-01-02T12:00:00Z", &["Dairy"]);

        let list = list_sensitivities(&db).unwrap();
        assert!(list.curated.contains(&"gluten"));
        assert_eq!(list.in_use[0].tag, "dairy");
        assert_eq!(list.in_use[0].entries, 2);
        assert!(list.in_use[0].curated);
        assert!(!list.in_use[1].curated);
    }
}
