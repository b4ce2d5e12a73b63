//! Data models
//!
//! Rust structs representing database entities.

mod diary_entry;
mod food_entry;
mod rating;
mod sensitivity;
mod wellness_entry;

pub use diary_entry::DiaryEntry;
pub use food_entry::{FoodEntry, FoodEntryCreate, FoodEntryUpdate, Ingredients, MealType};
pub use rating::{EnergyLevel, StomachRating};
pub use sensitivity::{Sensitivity, CURATED_SENSITIVITIES};
pub use wellness_entry::{WellnessEntry, WellnessEntryCreate, WellnessEntryUpdate};
