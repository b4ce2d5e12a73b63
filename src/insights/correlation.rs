//! Sensitivity correlation
//!
//! For each sensitivity tag, the share of days it was eaten that were
//! followed by a poor stomach check-in within a short lookahead window.
//!
//! A tag counts once per day no matter how many meals carried it. The
//! check-in for a day is the latest one recorded that day, the same rule the
//! day history uses.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::models::{DiaryEntry, Sensitivity, StomachRating};
use super::{supersedes, Aggregated, DayClock, SkippedEntry};

/// Days after a meal in which a reaction is attributed to it
pub const DEFAULT_WINDOW_DAYS: u32 = 2;

/// Longest lookahead window; longer requests are clamped to it
pub const MAX_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensitivityCorrelation {
    pub sensitivity: Sensitivity,
    /// 0..=100, rounded half up
    pub percentage: u8,
    pub total_occurrences: u32,
    pub low_score_count: u32,
}

#[derive(Default)]
struct Tally {
    total: u32,
    low: u32,
}

/// Correlate with the default two-day window
pub fn correlate(entries: &[DiaryEntry], clock: &DayClock) -> Aggregated<SensitivityCorrelation> {
    correlate_with_window(entries, clock, DEFAULT_WINDOW_DAYS)
}

/// Correlate each tag with a Poor or Very Poor stomach rating on any of the
/// `window_days` days after it was eaten. The window is clamped to
/// [`MAX_WINDOW_DAYS`].
///
/// Output is sorted by percentage, highest first; equal percentages keep the
/// order in which the tags were first seen.
pub fn correlate_with_window(
    entries: &[DiaryEntry],
    clock: &DayClock,
    window_days: u32,
) -> Aggregated<SensitivityCorrelation> {
    let window_days = window_days.min(MAX_WINDOW_DAYS);
    let mut daily: BTreeMap<NaiveDate, BTreeSet<Sensitivity>> = BTreeMap::new();
    let mut outcomes: HashMap<NaiveDate, (DateTime<FixedOffset>, StomachRating)> = HashMap::new();
    let mut first_seen: Vec<Sensitivity> = Vec::new();
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

        match entry {
            DiaryEntry::Food(food) => {
                let tags = Sensitivity::parse_all(&food.sensitivities);
                if tags.is_empty() {
                    continue;
                }
                for tag in &tags {
                    if !first_seen.contains(tag) {
                        first_seen.push(tag.clone());
                    }
                }
                daily.entry(day).or_default().extend(tags);
            }
            DiaryEntry::Wellness(checkin) => {
                let held = outcomes.get(&day).map(|(at, _)| at);
                if supersedes(&ts, held) {
                    outcomes.insert(day, (ts, checkin.stomach));
                }
            }
        }
    }

    let poor_on = |day: NaiveDate| {
        outcomes
            .get(&day)
            .is_some_and(|(_, stomach)| stomach.is_poor())
    };

    let mut tallies: HashMap<&Sensitivity, Tally> = HashMap::new();
    for (day, tags) in &daily {
        let reaction = (1..=u64::from(window_days))
            .map_while(|offset| day.checked_add_days(Days::new(offset)))
            .any(&poor_on);

        for tag in tags {
            let tally = tallies.entry(tag).or_default();
            tally.total += 1;
            if reaction {
                tally.low += 1;
            }
        }
    }

    let mut items: Vec<SensitivityCorrelation> = first_seen
        .iter()
        .filter_map(|tag| {
            let tally = tallies.get(tag)?;
            (tally.total > 0).then(|| SensitivityCorrelation {
                sensitivity: tag.clone(),
                percentage: percentage(tally.low, tally.total),
                total_occurrences: tally.total,
                low_score_count: tally.low,
            })
        })
        .collect();

    // sort_by is stable, so ties stay in first-seen order
    items.sort_by(|a, b| b.percentage.cmp(&a.percentage));

    tracing::debug!(
        tags = items.len(),
        days = daily.len(),
        window_days,
        skipped = skipped.len(),
        "Correlated sensitivities"
    );

    Aggregated { items, skipped }
}

/// round(100 * part / whole), halves rounded up
fn percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    ((200 * part + whole) / (2 * whole)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::{food, wellness};
    use crate::models::CURATED_SENSITIVITIES;

    fn find<'a>(result: &'a Aggregated<SensitivityCorrelation>, tag: &str) -> Option<&'a SensitivityCorrelation> {
        result.items.iter().find(|c| c.sensitivity.as_str() == tag)
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_empty_input() {
        let result = correlate(&[], &DayClock::utc());
        assert!(result.items.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_gluten_two_of_three() {
        let entries = vec![
            food(1, "2025-01-01T12:00:00Z", "Bread", &["gluten"]),
            wellness(2, "2025-01-02T09:00:00Z", StomachRating::Poor),
            food(3, "2025-01-05T12:00:00Z", "Pasta", &["gluten"]),
            wellness(4, "2025-01-07T09:00:00Z", StomachRating::VeryPoor),
            food(5, "2025-01-10T12:00:00Z", "Bagel", &["gluten"]),
            wellness(6, "2025-01-11T09:00:00Z", StomachRating::Good),
        ];
        let result = correlate(&entries, &DayClock::utc());
        let gluten = find(&result, "gluten").unwrap();
        assert_eq!(gluten.percentage, 67);
        assert_eq!(gluten.total_occurrences, 3);
        assert_eq!(gluten.low_score_count, 2);
    }

    #[test]
    fn test_window_boundary() {
        let within = vec![
            food(1, "2025-01-01T12:00:00Z", "Cheese", &["dairy"]),
            wellness(2, "2025-01-03T20:00:00Z", StomachRating::Poor),
        ];
        let beyond = vec![
            food(1, "2025-01-01T12:00:00Z", "Cheese", &["dairy"]),
            wellness(2, "2025-01-04T08:00:00Z", StomachRating::Poor),
        ];
        let clock = DayClock::utc();
        assert_eq!(find(&correlate(&within, &clock), "dairy").unwrap().percentage, 100);
        assert_eq!(find(&correlate(&beyond, &clock), "dairy").unwrap().percentage, 0);
    }

    #[test]
    fn test_same_day_checkin_is_not_a_reaction() {
        let entries = vec![
            food(1, "2025-01-01T08:00:00Z", "Cheese", &["dairy"]),
            wellness(2, "2025-01-01T20:00:00Z", StomachRating::VeryPoor),
        ];
        let result = correlate(&entries, &DayClock::utc());
        assert_eq!(find(&result, "dairy").unwrap().low_score_count, 0);
    }

    #[test]
    fn test_both_probe_days_poor_counts_once() {
        let entries = vec![
            food(1, "2025-01-01T12:00:00Z", "Cheese", &["dairy"]),
            wellness(2, "2025-01-02T12:00:00Z", StomachRating::Poor),
            wellness(3, "2025-01-03T12:00:00Z", StomachRating::VeryPoor),
        ];
        let result = correlate(&entries, &DayClock::utc());
        let dairy = find(&result, "dairy").unwrap();
        assert_eq!(dairy.low_score_count, 1);
        assert_eq!(dairy.percentage, 100);
    }

    #[test]
    fn test_no_double_counting_within_a_day() {
        let entries = vec![
            food(1, "2025-01-01T08:00:00Z", "Latte", &["dairy", "caffeine"]),
            food(2, "2025-01-01T19:00:00Z", "Pizza", &["dairy", "gluten"]),
        ];
        let result = correlate(&entries, &DayClock::utc());
        assert_eq!(find(&result, "dairy").unwrap().total_occurrences, 1);
    }

    #[test]
    fn test_tags_are_normalized() {
        let entries = vec![
            food(1, "2025-01-01T08:00:00Z", "Latte", &["Dairy"]),
            food(2, "2025-01-02T08:00:00Z", "Yogurt", &[" dairy "]),
            food(3, "2025-01-03T08:00:00Z", "Water", &["", "   "]),
        ];
        let result = correlate(&entries, &DayClock::utc());
        assert_eq!(result.items.len(), 1);
        assert_eq!(find(&result, "dairy").unwrap().total_occurrences, 2);
    }

    #[test]
    fn test_unused_curated_tags_absent() {
        let entries = vec![food(1, "2025-01-01T08:00:00Z", "Eggs", &["eggs"])];
        let result = correlate(&entries, &DayClock::utc());
        for curated in CURATED_SENSITIVITIES.iter().filter(|t| **t != "eggs") {
            assert!(find(&result, curated).is_none(), "{} should not appear", curated);
        }
        assert!(result.items.iter().all(|c| c.total_occurrences > 0));
    }

    #[test]
    fn test_sorted_desc_with_stable_ties() {
        let entries = vec![
            food(1, "2025-01-01T08:00:00Z", "Coffee", &["caffeine"]),
            food(2, "2025-01-01T12:00:00Z", "Soy latte", &["soy"]),
            food(3, "2025-01-05T12:00:00Z", "Cheese", &["dairy"]),
            wellness(4, "2025-01-06T09:00:00Z", StomachRating::Poor),
        ];
        let result = correlate(&entries, &DayClock::utc());
        let order: Vec<&str> = result.items.iter().map(|c| c.sensitivity.as_str()).collect();
        assert_eq!(order, vec!["dairy", "caffeine", "soy"]);
    }

    #[test]
    fn test_latest_checkin_of_day_decides_outcome() {
        // Input order puts the earlier, poor check-in last
        let entries = vec![
            food(1, "2025-01-01T12:00:00Z", "Cheese", &["dairy"]),
            wellness(2, "2025-01-02T21:00:00Z", StomachRating::Good),
            wellness(3, "2025-01-02T07:00:00Z", StomachRating::VeryPoor),
        ];
        let result = correlate_with_window(&entries, &DayClock::utc(), 1);
        assert_eq!(find(&result, "dairy").unwrap().low_score_count, 0);
    }

    #[test]
    fn test_custom_window() {
        let entries = vec![
            food(1, "2025-01-01T12:00:00Z", "Beans", &["fodmap"]),
            wellness(2, "2025-01-04T12:00:00Z", StomachRating::Poor),
        ];
        let clock = DayClock::utc();
        assert_eq!(find(&correlate_with_window(&entries, &clock, 3), "fodmap").unwrap().percentage, 100);
        assert_eq!(find(&correlate_with_window(&entries, &clock, 0), "fodmap").unwrap().percentage, 0);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let entries = vec![
            food(1, "2025-01-01T12:00:00Z", "Cheese", &["dairy"]),
            wellness(2, "2025-01-15T12:00:00Z", StomachRating::Poor),
            food(3, "2025-02-01T12:00:00Z", "Yogurt", &["dairy"]),
            wellness(4, "2025-02-16T12:00:00Z", StomachRating::Poor),
        ];
        let clock = DayClock::utc();

        let started = std::time::Instant::now();
        let huge = correlate_with_window(&entries, &clock, u32::MAX);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        // Day 14 is inside the longest window, day 15 is not
        assert_eq!(huge, correlate_with_window(&entries, &clock, MAX_WINDOW_DAYS));
        let dairy = find(&huge, "dairy").unwrap();
        assert_eq!(dairy.low_score_count, 1);
        assert_eq!(dairy.percentage, 50);
    }

    #[test]
    fn test_skipped_entries_reported() {
        let entries = vec![
            food(1, "2025-13-01", "Cheese", &["dairy"]),
            food(2, "2025-01-01T12:00:00Z", "Bread", &["gluten"]),
        ];
        let result = correlate(&entries, &DayClock::utc());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].id, 1);
        assert!(find(&result, "dairy").is_none());
    }

    #[test]
    fn test_idempotent() {
        let entries = vec![
            food(1, "2025-01-01T12:00:00Z", "Cheese", &["dairy", "fat"]),
            wellness(2, "2025-01-02T12:00:00Z", StomachRating::Poor),
            food(3, "2025-01-02T12:00:00Z", "Bread", &["gluten"]),
        ];
        let clock = DayClock::utc();
        assert_eq!(correlate(&entries, &clock), correlate(&entries, &clock));
    }
}
