//! Print the diary history and sensitivity insights to stdout
//!
//! Usage: fwd_report [DAYS]   (DAYS limits the history to the most recent N days)

use fwd::config::Config;
use fwd::db::Database;
use fwd::insights::{correlate_with_window, group_by_day};
use fwd::models::DiaryEntry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let limit_days = match std::env::args().nth(1) {
        Some(arg) => Some(arg.parse::<usize>().map_err(|_| format!("DAYS must be a number, got {:?}", arg))?),
        None => None,
    };

    let config = Config::from_env()?;
    println!("Database path: {}", config.database_path.display());
    if !config.database_path.exists() {
        return Err(format!("No diary at {}", config.database_path.display()).into());
    }

    let database = Database::open_migrated(&config.database_path)?;
    let entries = database.with_conn(DiaryEntry::load_all)?;
    let clock = config.clock;

    // History
    let history = group_by_day(&entries, &clock);
    let shown = limit_days.unwrap_or(history.items.len());
    println!();
    println!("=== History ({} days, UTC{}) ===", history.items.len(), clock.offset());
    for day in history.items.iter().take(shown) {
        println!();
        println!("{}", day.label);
        match &day.wellness {
            Some(w) => println!(
                "  Check-in {}: stomach {}, energy {}{}",
                w.time,
                w.stomach.display_name(),
                w.energy.display_name(),
                w.notes.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default()
            ),
            None => println!("  No check-in"),
        }
        for food in &day.foods {
            let tags = if food.sensitivities.is_empty() {
                String::new()
            } else {
                format!(" [{}]", food.sensitivities.join(", "))
            };
            println!("  {} {:<9} {}{}", food.time, food.meal_type.display_name(), food.food, tags);
        }
    }

    // Insights
    let insights = correlate_with_window(&entries, &clock, config.correlation_window_days);
    println!();
    println!("=== Sensitivity insights ({}-day window) ===", config.correlation_window_days);
    if insights.is_empty() {
        println!("  No tagged meals yet");
    }
    for row in &insights.items {
        println!(
            "  {:<24} {:>3}%  ({} of {} days)",
            row.sensitivity, row.percentage, row.low_score_count, row.total_occurrences
        );
    }

    let skipped = history.skipped.len();
    if skipped > 0 {
        println!();
        println!("{} entries skipped (unreadable dates):", skipped);
        for entry in &history.skipped {
            println!("  {} #{} {:?}: {}", entry.kind, entry.id, entry.date, entry.reason);
        }
    }

    Ok(())
}
