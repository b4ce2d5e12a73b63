//! Food and Wellness Entry MCP Tools
//!
//! Tools for logging meals and check-ins and managing individual entries.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::db::{Database, DbError};
use crate::insights::DayClock;
use crate::models::{
    DiaryEntry, EnergyLevel, FoodEntry, FoodEntryCreate, FoodEntryUpdate, Ingredients, MealType,
    Sensitivity, StomachRating, WellnessEntry, WellnessEntryCreate, WellnessEntryUpdate,
};

/// Response for log_food / update_food_entry
#[derive(Debug, Serialize)]
pub struct FoodEntryResponse {
    pub entry: FoodEntry,
    pub day: String,
    /// Meal type as shown in history (logged or derived from time of day)
    pub meal_type: MealType,
    /// Tags outside the curated list; kept, but worth double-checking
    pub uncurated_sensitivities: Vec<String>,
}

/// Response for log_wellness / update_wellness_entry
#[derive(Debug, Serialize)]
pub struct WellnessEntryResponse {
    pub entry: WellnessEntry,
    pub day: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: i64,
    pub message: String,
}

/// Response for list_entries
#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    pub entries: Vec<DiaryEntry>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    /// Entries whose date could not be read (listed last, never range-filtered)
    pub unreadable_dates: usize,
}

// ============================================================================
// Validation
// ============================================================================

/// Parse a timestamp, defaulting to now, and return it in RFC 3339 form
fn resolve_timestamp(clock: &DayClock, raw: Option<&str>) -> Result<DateTime<FixedOffset>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => clock.parse(raw).map_err(|e| e.to_string()),
        None => Ok(chrono::Utc::now().with_timezone(&clock.offset())),
    }
}

fn parse_meal_type(raw: Option<&str>) -> Result<Option<MealType>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => MealType::from_str(s)
            .map(Some)
            .ok_or_else(|| format!("Unknown meal type: {} (use breakfast, lunch, dinner, or snack)", s)),
        None => Ok(None),
    }
}

fn parse_stomach(raw: &str) -> Result<StomachRating, String> {
    StomachRating::from_str(raw)
        .ok_or_else(|| format!("Unknown stomach rating: {} (use very_poor, poor, okay, good, or excellent)", raw))
}

fn parse_energy(raw: &str) -> Result<EnergyLevel, String> {
    EnergyLevel::from_str(raw)
        .ok_or_else(|| format!("Unknown energy level: {} (use very_low, low, moderate, high, or very_high)", raw))
}

/// Normalize tags, rejecting any that normalize to nothing
pub fn normalize_sensitivities(raw: &[String]) -> Result<Vec<String>, String> {
    if let Some(bad) = raw.iter().find(|t| Sensitivity::parse(t).is_none()) {
        return Err(format!("Invalid sensitivity tag: {:?}", bad));
    }
    Ok(Sensitivity::parse_all(raw).into_iter().map(String::from).collect())
}

fn uncurated(tags: &[String]) -> Vec<String> {
    Sensitivity::parse_all(tags)
        .into_iter()
        .filter(|t| !t.is_curated())
        .map(String::from)
        .collect()
}

pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: {} (expected YYYY-MM-DD)", raw))
}

fn food_response(clock: &DayClock, entry: FoodEntry) -> FoodEntryResponse {
    let ts = clock.parse(&entry.date).ok();
    let meal_type = entry
        .meal_type
        .or_else(|| ts.map(|ts| MealType::from_time(ts.time())))
        .unwrap_or(MealType::Snack);
    FoodEntryResponse {
        day: ts
            .map(|ts| DayClock::day_label(clock.day_of(&ts)))
            .unwrap_or_default(),
        meal_type,
        uncurated_sensitivities: uncurated(&entry.sensitivities),
        entry,
    }
}

fn wellness_response(clock: &DayClock, entry: WellnessEntry) -> WellnessEntryResponse {
    WellnessEntryResponse {
        day: clock
            .day_of_str(&entry.date)
            .map(DayClock::day_label)
            .unwrap_or_default(),
        entry,
    }
}

fn db_message(context: &str, e: DbError) -> String {
    match e {
        DbError::Invalid(msg) => msg,
        other => format!("{}: {}", context, other),
    }
}

// ============================================================================
// Food Entry Tools
// ============================================================================

/// Log a meal
#[allow(clippy::too_many_arguments)]
pub fn log_food(
    db: &Database,
    clock: &DayClock,
    date: Option<&str>,
    food: &str,
    ingredients: Ingredients,
    sensitivities: &[String],
    meal_type: Option<&str>,
    description: Option<String>,
) -> Result<FoodEntryResponse, String> {
    if food.trim().is_empty() {
        return Err("Food name must not be empty".to_string());
    }
    let ts = resolve_timestamp(clock, date)?;

    let data = FoodEntryCreate {
        date: ts.to_rfc3339(),
        food: food.trim().to_string(),
        ingredients,
        sensitivities: normalize_sensitivities(sensitivities)?,
        meal_type: parse_meal_type(meal_type)?,
        description,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = FoodEntry::create(&conn, &data).map_err(|e| db_message("Failed to log food", e))?;

    tracing::info!("Logged food entry {} ({})", entry.id, entry.food);
    Ok(food_response(clock, entry))
}

/// Get a food entry by ID
pub fn get_food_entry(db: &Database, clock: &DayClock, id: i64) -> Result<Option<FoodEntryResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let entry = FoodEntry::get_by_id(&conn, id).map_err(|e| format!("Failed to get food entry: {}", e))?;
    Ok(entry.map(|e| food_response(clock, e)))
}

/// Update a food entry
#[allow(clippy::too_many_arguments)]
pub fn update_food_entry(
    db: &Database,
    clock: &DayClock,
    id: i64,
    date: Option<&str>,
    food: Option<String>,
    ingredients: Option<Ingredients>,
    sensitivities: Option<Vec<String>>,
    meal_type: Option<&str>,
    description: Option<String>,
) -> Result<Option<FoodEntryResponse>, String> {
    let date = match date {
        Some(raw) => Some(clock.parse(raw).map_err(|e| e.to_string())?.to_rfc3339()),
        None => None,
    };
    let sensitivities = match sensitivities {
        Some(tags) => Some(normalize_sensitivities(&tags)?),
        None => None,
    };

    let data = FoodEntryUpdate {
        date,
        food,
        ingredients,
        sensitivities,
        meal_type: parse_meal_type(meal_type)?,
        description,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = FoodEntry::update(&conn, id, &data).map_err(|e| db_message("Failed to update food entry", e))?;
    Ok(updated.map(|e| food_response(clock, e)))
}

/// Delete a food entry
pub fn delete_food_entry(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = FoodEntry::delete(&conn, id).map_err(|e| format!("Failed to delete food entry: {}", e))?;
    Ok(DeleteResponse {
        success: deleted,
        id,
        message: if deleted {
            format!("Deleted food entry {}", id)
        } else {
            format!("Food entry not found: {}", id)
        },
    })
}

// ============================================================================
// Wellness Entry Tools
// ============================================================================

/// Log a wellness check-in
pub fn log_wellness(
    db: &Database,
    clock: &DayClock,
    date: Option<&str>,
    stomach: &str,
    energy: &str,
    notes: Option<String>,
) -> Result<WellnessEntryResponse, String> {
    let ts = resolve_timestamp(clock, date)?;

    let data = WellnessEntryCreate {
        date: ts.to_rfc3339(),
        stomach: parse_stomach(stomach)?,
        energy: parse_energy(energy)?,
        notes,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = WellnessEntry::create(&conn, &data).map_err(|e| db_message("Failed to log check-in", e))?;

    tracing::info!("Logged wellness entry {} (stomach: {})", entry.id, entry.stomach.display_name());
    Ok(wellness_response(clock, entry))
}

/// Get a wellness entry by ID
pub fn get_wellness_entry(db: &Database, clock: &DayClock, id: i64) -> Result<Option<WellnessEntryResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let entry = WellnessEntry::get_by_id(&conn, id).map_err(|e| format!("Failed to get wellness entry: {}", e))?;
    Ok(entry.map(|e| wellness_response(clock, e)))
}

/// Update a wellness entry
pub fn update_wellness_entry(
    db: &Database,
    clock: &DayClock,
    id: i64,
    date: Option<&str>,
    stomach: Option<&str>,
    energy: Option<&str>,
    notes: Option<String>,
) -> Result<Option<WellnessEntryResponse>, String> {
    let data = WellnessEntryUpdate {
        date: match date {
            Some(raw) => Some(clock.parse(raw).map_err(|e| e.to_string())?.to_rfc3339()),
            None => None,
        },
        stomach: stomach.map(parse_stomach).transpose()?,
        energy: energy.map(parse_energy).transpose()?,
        notes,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = WellnessEntry::update(&conn, id, &data)
        .map_err(|e| db_message("Failed to update wellness entry", e))?;
    Ok(updated.map(|e| wellness_response(clock, e)))
}

/// Delete a wellness entry
pub fn delete_wellness_entry(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = WellnessEntry::delete(&conn, id).map_err(|e| format!("Failed to delete wellness entry: {}", e))?;
    Ok(DeleteResponse {
        success: deleted,
        id,
        message: if deleted {
            format!("Deleted wellness entry {}", id)
        } else {
            format!("Wellness entry not found: {}", id)
        },
    })
}

// ============================================================================
// Listing
// ============================================================================

/// Load every entry; shared by the list, history and insight tools
pub fn load_entries(db: &Database) -> Result<Vec<DiaryEntry>, String> {
    db.with_conn(DiaryEntry::load_all)
        .map_err(|e| format!("Failed to load diary entries: {}", e))
}

/// List entries newest first, optionally within an inclusive day range
#[allow(clippy::too_many_arguments)]
pub fn list_entries(
    db: &Database,
    clock: &DayClock,
    start_date: Option<&str>,
    end_date: Option<&str>,
    kind: Option<&str>,
    limit: usize,
    offset: usize,
) -> Result<ListEntriesResponse, String> {
    let limit = limit.clamp(1, 200);
    let start = start_date.map(parse_day).transpose()?;
    let end = end_date.map(parse_day).transpose()?;
    let kind = match kind.map(|k| k.trim().to_lowercase()) {
        Some(k) if k == "food" || k == "wellness" => Some(k),
        Some(k) if k.is_empty() || k == "all" => None,
        Some(k) => return Err(format!("Unknown entry kind: {} (use food, wellness, or all)", k)),
        None => None,
    };

    let mut dated: Vec<(Option<DateTime<FixedOffset>>, DiaryEntry)> = load_entries(db)?
        .into_iter()
        .filter(|e| kind.as_deref().map_or(true, |k| e.kind() == k))
        .map(|e| (clock.parse(e.date()).ok(), e))
        .filter(|(ts, _)| match ts {
            Some(ts) => {
                let day = clock.day_of(ts);
                start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
            }
            None => true,
        })
        .collect();

    // Newest first; unreadable dates last
    dated.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let total = dated.len();
    let unreadable_dates = dated.iter().filter(|(ts, _)| ts.is_none()).count();
    let entries = dated
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(_, e)| e)
        .collect();

    Ok(ListEntriesResponse {
        entries,
        total,
        limit,
        offset,
        unreadable_dates,
    })
}
