//! Meal Analysis MCP Tools
//!
//! Runs the meal analyzer behind the analysis cache.

use std::time::Duration;

use serde::Serialize;

use crate::analyzer::{AnalysisRequest, MealAnalysis, MealAnalyzer};
use crate::cache::{cache_key, AnalysisCache};

/// Response for analyze_meal
#[derive(Debug, Serialize)]
pub struct AnalyzeMealResponse {
    pub cached: bool,
    pub cache_key: String,
    pub analysis: MealAnalysis,
}

/// Response for evict_analysis
#[derive(Debug, Serialize)]
pub struct EvictAnalysisResponse {
    pub evicted: bool,
    pub cache_key: String,
    pub expired_purged: usize,
}

/// Analyze a meal, serving repeat requests from the cache.
///
/// Cache failures are logged and the model is called anyway; `refresh`
/// skips the lookup and overwrites whatever was stored.
pub async fn analyze_meal(
    analyzer: &dyn MealAnalyzer,
    cache: &dyn AnalysisCache,
    ttl: Duration,
    description: &str,
    image: Option<&str>,
    refresh: bool,
) -> Result<AnalyzeMealResponse, String> {
    let request = AnalysisRequest {
        description: description.trim().to_string(),
        image: image.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
    };
    if request.is_empty() {
        return Err("Provide a meal description or an image".to_string());
    }

    let key = cache_key(&request.description, request.image.as_deref());

    if !refresh {
        match cache.get(&key) {
            Ok(Some(analysis)) => {
                tracing::debug!("Analysis cache hit for {:?}", key);
                return Ok(AnalyzeMealResponse {
                    cached: true,
                    cache_key: key,
                    analysis,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Analysis cache lookup failed: {}", e),
        }
    }

    let analysis = analyzer
        .analyze(&request)
        .await
        .map_err(|e| e.to_string())?;

    if let Err(e) = cache.put(&key, &analysis, ttl) {
        tracing::warn!("Failed to cache analysis: {}", e);
    }

    tracing::info!("Analyzed meal: {}", analysis.food);
    Ok(AnalyzeMealResponse {
        cached: false,
        cache_key: key,
        analysis,
    })
}

/// Drop the cached analysis for a description/image and purge expired entries
pub fn evict_analysis(
    cache: &dyn AnalysisCache,
    description: &str,
    image: Option<&str>,
) -> Result<EvictAnalysisResponse, String> {
    let key = cache_key(description, image);
    let evicted = cache
        .evict(&key)
        .map_err(|e| format!("Failed to evict analysis: {}", e))?;
    let expired_purged = cache
        .purge_expired()
        .map_err(|e| format!("Failed to purge cache: {}", e))?;

    Ok(EvictAnalysisResponse {
        evicted,
        cache_key: key,
        expired_purged,
    })
}
