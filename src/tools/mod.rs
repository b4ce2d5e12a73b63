//! FWD Tools module
//!
//! MCP tool implementations for the Food & Wellness Diary.

pub mod analysis;
pub mod entries;
pub mod history;
pub mod insights;
pub mod status;
