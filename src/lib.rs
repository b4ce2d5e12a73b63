//! Food & Wellness Diary (FWD) Library
//!
//! Meal and wellness logging with per-day history and sensitivity insights.

pub mod analyzer;
pub mod build_info;
pub mod cache;
pub mod config;
pub mod db;
pub mod insights;
pub mod mcp;
pub mod models;
pub mod tools;
