//! Wellness rating scales
//!
//! Ordinal five-point scales reported in a wellness check-in.

use serde::{Deserialize, Serialize};

/// Stomach comfort, worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StomachRating {
    VeryPoor,
    Poor,
    Okay,
    Good,
    Excellent,
}

impl StomachRating {
    pub const ALL: [StomachRating; 5] = [
        StomachRating::VeryPoor,
        StomachRating::Poor,
        StomachRating::Okay,
        StomachRating::Good,
        StomachRating::Excellent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StomachRating::VeryPoor => "very_poor",
            StomachRating::Poor => "poor",
            StomachRating::Okay => "okay",
            StomachRating::Good => "good",
            StomachRating::Excellent => "excellent",
        }
    }

    /// Accepts both the stored form ("very_poor") and the display form ("Very Poor")
    pub fn from_str(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "very_poor" => Some(StomachRating::VeryPoor),
            "poor" => Some(StomachRating::Poor),
            "okay" | "ok" => Some(StomachRating::Okay),
            "good" => Some(StomachRating::Good),
            "excellent" => Some(StomachRating::Excellent),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StomachRating::VeryPoor => "Very Poor",
            StomachRating::Poor => "Poor",
            StomachRating::Okay => "Okay",
            StomachRating::Good => "Good",
            StomachRating::Excellent => "Excellent",
        }
    }

    /// Poor or Very Poor: the outcome the correlator looks for
    pub fn is_poor(&self) -> bool {
        *self <= StomachRating::Poor
    }
}

/// Energy level, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 5] = [
        EnergyLevel::VeryLow,
        EnergyLevel::Low,
        EnergyLevel::Moderate,
        EnergyLevel::High,
        EnergyLevel::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::VeryLow => "very_low",
            EnergyLevel::Low => "low",
            EnergyLevel::Moderate => "moderate",
            EnergyLevel::High => "high",
            EnergyLevel::VeryHigh => "very_high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "very_low" => Some(EnergyLevel::VeryLow),
            "low" => Some(EnergyLevel::Low),
            "moderate" | "medium" => Some(EnergyLevel::Moderate),
            "high" => Some(EnergyLevel::High),
            "very_high" => Some(EnergyLevel::VeryHigh),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EnergyLevel::VeryLow => "Very Low",
            EnergyLevel::Low => "Low",
            EnergyLevel::Moderate => "Moderate",
            EnergyLevel::High => "High",
            EnergyLevel::VeryHigh => "Very High",
        }
    }
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
