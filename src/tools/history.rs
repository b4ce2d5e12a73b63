//! Day History MCP Tool

use serde::Serialize;

use crate::db::Database;
use crate::insights::{group_by_day, DayBucket, DayClock, SkippedEntry};

use super::entries::{load_entries, parse_day};

/// Response for get_history
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub timezone: String,
    pub days: Vec<DayBucket>,
    /// Days with entries in range, before `limit_days` was applied
    pub total_days: usize,
    pub skipped_entries: Vec<SkippedEntry>,
}

/// Day cards, newest first, optionally within an inclusive date range
pub fn get_history(
    db: &Database,
    clock: &DayClock,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit_days: Option<usize>,
) -> Result<HistoryResponse, String> {
    let start = start_date.map(parse_day).transpose()?;
    let end = end_date.map(parse_day).transpose()?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(format!("start_date {} is after end_date {}", s, e));
        }
    }

    let entries = load_entries(db)?;
    let grouped = group_by_day(&entries, clock);

    let days: Vec<DayBucket> = grouped
        .items
        .into_iter()
        .filter(|b| start.map_or(true, |s| b.day >= s) && end.map_or(true, |e| b.day <= e))
        .collect();
    let total_days = days.len();
    let days = match limit_days {
        Some(limit) => days.into_iter().take(limit).collect(),
        None => days,
    };

    Ok(HistoryResponse {
        timezone: clock.offset().to_string(),
        days,
        total_days,
        skipped_entries: grouped.skipped,
    })
}
