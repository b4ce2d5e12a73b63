//! Day history
//!
//! Groups diary entries into one bucket per calendar day, newest day first.
//! Each bucket keeps every meal of the day and only the latest check-in.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::models::{DiaryEntry, EnergyLevel, Ingredients, MealType, Sensitivity, StomachRating};
use super::{supersedes, Aggregated, DayClock, SkippedEntry};

/// A meal as shown in a day card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub time: String,
    pub meal_type: MealType,
    pub food: String,
    pub ingredients: Ingredients,
    pub sensitivities: Vec<String>,
}

/// The check-in shown for a day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellnessSummary {
    pub id: i64,
    pub time: String,
    pub recorded_at: DateTime<FixedOffset>,
    pub stomach: StomachRating,
    pub energy: EnergyLevel,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub label: String,
    pub wellness: Option<WellnessSummary>,
    pub foods: Vec<FoodSummary>,
}

impl DayBucket {
    fn new(day: NaiveDate) -> Self {
        Self {
            day,
            label: DayClock::day_label(day),
            wellness: None,
            foods: Vec::new(),
        }
    }
}

/// Group entries by calendar day in `clock`'s offset.
///
/// Meals keep the order they appear in `entries`. A later check-in on the
/// same day replaces an earlier one regardless of input order.
pub fn group_by_day(entries: &[DiaryEntry], clock: &DayClock) -> Aggregated<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    let mut slots: HashMap<NaiveDate, usize> = HashMap::new();
    let mut skipped = Vec::new();

    for entry in entries {
        let ts = match clock.parse(entry.date()) {
            Ok(ts) => ts,
            Err(e) => {
                skipped.push(SkippedEntry::new(entry, &e));
                continue;
            }
        };
        let day = clock.day_of(&ts);

        let slot = *slots.entry(day).or_insert_with(|| {
            buckets.push(DayBucket::new(day));
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot];

        match entry {
            DiaryEntry::Food(food) => bucket.foods.push(FoodSummary {
                id: food.id,
                time: clock.time_label(&ts),
                meal_type: food
                    .meal_type
                    .unwrap_or_else(|| MealType::from_time(ts.time())),
                food: food.food.clone(),
                ingredients: food.ingredients.clone(),
                sensitivities: Sensitivity::parse_all(&food.sensitivities)
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }),
            DiaryEntry::Wellness(checkin) => {
                let held = bucket.wellness.as_ref().map(|w| &w.recorded_at);
                if supersedes(&ts, held) {
                    bucket.wellness = Some(WellnessSummary {
                        id: checkin.id,
                        time: clock.time_label(&ts),
                        recorded_at: ts,
                        stomach: checkin.stomach,
                        energy: checkin.energy,
                        notes: checkin.notes.clone(),
                    });
                }
            }
        }
    }

    buckets.sort_by(|a, b| b.day.cmp(&a.day));

    tracing::debug!(days = buckets.len(), skipped = skipped.len(), "Grouped diary by day");

    Aggregated {
        items: buckets,
        skipped,
    }
}
