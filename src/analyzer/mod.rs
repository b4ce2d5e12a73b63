//! Meal analysis
//!
//! A vision/language model turns a meal photo or description into a food
//! name, ingredient list and sensitivity tags. The model is reached through
//! the [`MealAnalyzer`] trait; [`HttpAnalyzer`] talks to an OpenAI-compatible
//! chat completions endpoint.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MealType, Sensitivity};

pub use http::HttpAnalyzer;

/// Instructions sent with every analysis request
pub const SYSTEM_PROMPT: &str = "You are a nutrition assistant for a food sensitivity diary. \
Identify the meal in the user's photo or description. Respond with a single JSON object and \
nothing else, using exactly these keys: \
\"food\" (short dish name), \
\"ingredients\" (array of likely ingredient names), \
\"sensitivities\" (array of lowercase tags from: dairy, gluten, wheat, soy, eggs, nuts, peanuts, \
shellfish, fish, fodmap, nightshades, caffeine, alcohol, spicy, high fat, sugar, artificial sweeteners), \
\"meal_type\" (breakfast, lunch, dinner, snack, or null if unclear), \
\"notes\" (one short sentence or null).";

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Meal analysis is not configured: {0}")]
    NotConfigured(String),

    #[error("Analysis request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Analysis API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned an unusable analysis: {0}")]
    Malformed(String),

    #[error("Nothing to analyse: provide a description or an image")]
    EmptyRequest,
}

/// What the user captured
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub description: String,
    /// Image URL or `data:` URI
    pub image: Option<String>,
}

impl AnalysisRequest {
    pub fn is_empty(&self) -> bool {
        self.description.trim().is_empty() && self.image.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

/// Structured model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub food: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub sensitivities: Vec<String>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[async_trait]
pub trait MealAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<MealAnalysis, AnalyzerError>;
}

/// Parse the model's message content into a [`MealAnalysis`].
///
/// Tolerates a ```json fence and text around the object. Sensitivity tags
/// are normalized and empty ingredients dropped.
pub fn parse_analysis(content: &str) -> Result<MealAnalysis, AnalyzerError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => return Err(AnalyzerError::Malformed("no JSON object in response".to_string())),
    };

    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

    let food = raw
        .get("food")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AnalyzerError::Malformed("missing food name".to_string()))?
        .to_string();

    let strings = |key: &str| -> Vec<String> {
        match raw.get(key) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(serde_json::Value::String(text)) => text
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    };

    let sensitivities = Sensitivity::parse_all(strings("sensitivities"))
        .into_iter()
        .map(String::from)
        .collect();

    Ok(MealAnalysis {
        food,
        ingredients: strings("ingredients"),
        sensitivities,
        meal_type: raw
            .get("meal_type")
            .and_then(|v| v.as_str())
            .and_then(MealType::from_str),
        notes: raw
            .get("notes")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}
