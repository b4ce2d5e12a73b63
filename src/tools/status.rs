//! FWD Status Tool
//!
//! Provides runtime status information about the FWD service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::{FoodEntry, WellnessEntry};

/// Diary logging instructions for AI assistants
pub const DIARY_INSTRUCTIONS: &str = r#"
# FWD Diary Instructions

The Food & Wellness Diary records what the user eats and how they feel, then
looks for sensitivities that tend to precede a bad stomach day.

## Entries

There are two kinds of entry:

1. **Food entries** (`log_food`): one per meal or snack
   - `food`: short name ("Chicken burrito")
   - `ingredients`: a list, or free text when the user gives a sentence
   - `sensitivities`: tags such as `dairy`, `gluten`, `fodmap`
   - `meal_type` (optional): breakfast, lunch, dinner, or snack
   - `date` (optional): timestamp of the meal, defaults to now
2. **Wellness check-ins** (`log_wellness`): how the user feels
   - `stomach`: very_poor, poor, okay, good, excellent
   - `energy`: very_low, low, moderate, high, very_high
   - `notes` (optional)

Call `list_sensitivities` for the curated tag list. Other tags are accepted,
but sticking to curated ones keeps the insights meaningful.

---

## Dates and Times

- Full timestamps (`2025-01-09T12:30:00-05:00`) are converted to the diary timezone
- Timestamps without an offset (`2025-01-09 12:30`) are read in the diary timezone
- A bare date (`2025-01-09`) means midnight
- Meals without a `meal_type` are labelled by time of day:
  breakfast 05:00-10:59, lunch 11:00-14:59, dinner 17:00-21:59, otherwise snack

---

## Photos and Descriptions

`analyze_meal` sends a description and/or an image (URL or `data:` URI) to the
configured model and returns a suggested food name, ingredients, tags and meal
type. Results are cached, so asking again about the same meal is free.
Show the suggestion to the user and call `log_food` once they confirm.
Use `evict_analysis` (or `refresh: true`) if a cached suggestion is wrong.

---

## History and Insights

- `get_history`: one card per day, newest first, with every meal and the
  day's check-in. If several check-ins were logged on a day, the latest wins.
- `get_sensitivity_insights`: for each tag, the percentage of days it was
  eaten that were followed by a poor or very poor stomach within the next
  two days (configurable via `window_days`). Same-day check-ins do not count.

Percentages are a prompt for conversation, not a diagnosis. Small sample
sizes (`total_occurrences` under 5) deserve a caveat.

---

## Editing

- `update_food_entry` / `update_wellness_entry`: only the fields passed change
- `delete_food_entry` / `delete_wellness_entry`: by ID
- `list_entries`: browse entries newest first, filter by date range or kind
"#;

/// Runtime status of the FWD service
#[derive(Debug, Clone, Serialize)]
pub struct FwdStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub food_entries: Option<i64>,
    pub wellness_entries: Option<i64>,

    /// Diary settings
    pub timezone: String,
    pub correlation_window_days: u32,
    pub analyzer_configured: bool,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Settings echoed back by the status tool
#[derive(Debug, Clone)]
pub struct StatusSettings {
    pub timezone: String,
    pub correlation_window_days: u32,
    pub analyzer_configured: bool,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    settings: StatusSettings,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf, settings: StatusSettings) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            settings,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> FwdStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Counts are best effort; status should answer even if the DB is unhappy
        let counts = db.with_conn(|conn| Ok((FoodEntry::count(conn)?, WellnessEntry::count(conn)?)));
        let (food_entries, wellness_entries) = match counts {
            Ok((food, wellness)) => (Some(food), Some(wellness)),
            Err(e) => {
                tracing::warn!("Failed to count entries: {}", e);
                (None, None)
            }
        };

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FwdStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            food_entries,
            wellness_entries,
            timezone: self.settings.timezone.clone(),
            correlation_window_days: self.settings.correlation_window_days,
            analyzer_configured: self.settings.analyzer_configured,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_counts_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fwd.db");
        let db = Database::open_migrated(&path).unwrap();

        let tracker = StatusTracker::new(
            path,
            StatusSettings {
                timezone: "+02:00".to_string(),
                correlation_window_days: 2,
                analyzer_configured: false,
            },
        );
        let status = tracker.get_status(&db);

        assert_eq!(status.food_entries, Some(0));
        assert_eq!(status.wellness_entries, Some(0));
        assert_eq!(status.timezone, "+02:00");
        assert!(status.database_size_bytes.is_some());
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_instructions_cover_core_tools() {
        for tool in ["log_food", "log_wellness", "get_history", "get_sensitivity_insights", "analyze_meal"] {
            assert!(DIARY_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
