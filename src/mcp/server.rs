//! FWD MCP Server Implementation
//!
//! Implements the MCP server with all FWD tools.

use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::analyzer::MealAnalyzer;
use crate::cache::AnalysisCache;
use crate::config::Config;
use crate::db::Database;
use crate::insights::DayClock;
use crate::models::Ingredients;
use crate::tools::analysis;
use crate::tools::entries;
use crate::tools::history;
use crate::tools::insights;
use crate::tools::status::{StatusSettings, StatusTracker};

/// FWD MCP Service
#[derive(Clone)]
pub struct FwdService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    clock: DayClock,
    correlation_window_days: u32,
    cache_ttl: Duration,
    analyzer: Arc<dyn MealAnalyzer>,
    cache: Arc<dyn AnalysisCache>,
    tool_router: ToolRouter<FwdService>,
}

impl FwdService {
    pub fn new(
        config: &Config,
        database: Database,
        analyzer: Arc<dyn MealAnalyzer>,
        cache: Arc<dyn AnalysisCache>,
    ) -> Self {
        let settings = StatusSettings {
            timezone: config.clock.offset().to_string(),
            correlation_window_days: config.correlation_window_days,
            analyzer_configured: config.analyzer_api_key.is_some(),
        };
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.database_path.clone(), settings))),
            database,
            clock: config.clock,
            correlation_window_days: config.correlation_window_days,
            cache_ttl: config.cache_ttl,
            analyzer,
            cache,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(what: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        what, id
    ))]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

/// Ingredients as a list or as free text
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum IngredientsParam {
    List(Vec<String>),
    Text(String),
}

impl From<IngredientsParam> for Ingredients {
    fn from(value: IngredientsParam) -> Self {
        match value {
            IngredientsParam::List(items) => Ingredients::List(items),
            IngredientsParam::Text(text) => Ingredients::Text(text),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    /// When the meal was eaten; RFC 3339, "YYYY-MM-DD HH:MM", or "YYYY-MM-DD". Defaults to now.
    pub date: Option<String>,
    pub food: String,
    pub ingredients: Option<IngredientsParam>,
    #[serde(default)]
    pub sensitivities: Vec<String>,
    /// breakfast, lunch, dinner, or snack; derived from the time when omitted
    pub meal_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodEntryParams {
    pub id: i64,
    pub date: Option<String>,
    pub food: Option<String>,
    pub ingredients: Option<IngredientsParam>,
    pub sensitivities: Option<Vec<String>>,
    pub meal_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogWellnessParams {
    pub date: Option<String>,
    /// very_poor, poor, okay, good, or excellent
    pub stomach: String,
    /// very_low, low, moderate, high, or very_high
    pub energy: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateWellnessEntryParams {
    pub id: i64,
    pub date: Option<String>,
    pub stomach: Option<String>,
    pub energy: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EntryIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListEntriesParams {
    /// First day to include (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Last day to include (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// food, wellness, or all
    pub kind: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_list_limit() -> usize { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetHistoryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Most recent N days only
    pub limit_days: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetInsightsParams {
    /// Days after a meal in which a poor stomach counts against it (1-14)
    pub window_days: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeMealParams {
    #[serde(default)]
    pub description: String,
    /// Image URL or data: URI
    pub image: Option<String>,
    /// Ignore any cached result
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EvictAnalysisParams {
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FwdService {
    // --- Status ---

    #[tool(description = "Get the current status of the FWD service including build info, database status, diary settings, and process information")]
    async fn fwd_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    #[tool(description = "Get instructions for logging meals and check-ins and reading insights. Call this when starting a diary session or when unsure how to use the tools.")]
    fn diary_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::DIARY_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(DIARY_INSTRUCTIONS)]))
    }

    #[tool(description = "List the curated sensitivity tags and the tags already used in the diary")]
    fn list_sensitivities(&self) -> Result<CallToolResult, McpError> {
        let result = insights::list_sensitivities(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Meal Analysis ---

    #[tool(description = "Suggest food name, ingredients, sensitivity tags and meal type from a meal description and/or photo. Results are cached; set refresh=true to ask the model again. Does not log anything.")]
    async fn analyze_meal(&self, Parameters(p): Parameters<AnalyzeMealParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::analyze_meal(
            self.analyzer.as_ref(),
            self.cache.as_ref(),
            self.cache_ttl,
            &p.description,
            p.image.as_deref(),
            p.refresh,
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove the cached analysis for a description/photo and purge expired cache entries")]
    fn evict_analysis(&self, Parameters(p): Parameters<EvictAnalysisParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::evict_analysis(self.cache.as_ref(), &p.description, p.image.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Food Entries ---

    #[tool(description = "Log a meal with its ingredients and sensitivity tags")]
    fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let result = entries::log_food(
            &self.database,
            &self.clock,
            p.date.as_deref(),
            &p.food,
            p.ingredients.map(Ingredients::from).unwrap_or_default(),
            &p.sensitivities,
            p.meal_type.as_deref(),
            p.description,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a food entry by ID")]
    fn get_food_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = entries::get_food_entry(&self.database, &self.clock, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(entry) => json_result(&entry),
            None => not_found("Food entry", p.id),
        }
    }

    #[tool(description = "Update a food entry. Only the fields provided are changed.")]
    fn update_food_entry(&self, Parameters(p): Parameters<UpdateFoodEntryParams>) -> Result<CallToolResult, McpError> {
        let result = entries::update_food_entry(
            &self.database,
            &self.clock,
            p.id,
            p.date.as_deref(),
            p.food,
            p.ingredients.map(Ingredients::from),
            p.sensitivities,
            p.meal_type.as_deref(),
            p.description,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(entry) => json_result(&entry),
            None => not_found("Food entry", p.id),
        }
    }

    #[tool(description = "Delete a food entry by ID")]
    fn delete_food_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = entries::delete_food_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Wellness Entries ---

    #[tool(description = "Log a wellness check-in: stomach rating, energy level, and optional notes")]
    fn log_wellness(&self, Parameters(p): Parameters<LogWellnessParams>) -> Result<CallToolResult, McpError> {
        let result = entries::log_wellness(
            &self.database,
            &self.clock,
            p.date.as_deref(),
            &p.stomach,
            &p.energy,
            p.notes,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a wellness check-in by ID")]
    fn get_wellness_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = entries::get_wellness_entry(&self.database, &self.clock, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(entry) => json_result(&entry),
            None => not_found("Wellness entry", p.id),
        }
    }

    #[tool(description = "Update a wellness check-in. Only the fields provided are changed.")]
    fn update_wellness_entry(&self, Parameters(p): Parameters<UpdateWellnessEntryParams>) -> Result<CallToolResult, McpError> {
        let result = entries::update_wellness_entry(
            &self.database,
            &self.clock,
            p.id,
            p.date.as_deref(),
            p.stomach.as_deref(),
            p.energy.as_deref(),
            p.notes,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(entry) => json_result(&entry),
            None => not_found("Wellness entry", p.id),
        }
    }

    #[tool(description = "Delete a wellness check-in by ID")]
    fn delete_wellness_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = entries::delete_wellness_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- History & Insights ---

    #[tool(description = "List diary entries newest first, optionally filtered by date range (YYYY-MM-DD) and kind (food, wellness)")]
    fn list_entries(&self, Parameters(p): Parameters<ListEntriesParams>) -> Result<CallToolResult, McpError> {
        let result = entries::list_entries(
            &self.database,
            &self.clock,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.kind.as_deref(),
            p.limit,
            p.offset,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get the diary as one card per day, newest first: every meal plus the day's latest wellness check-in")]
    fn get_history(&self, Parameters(p): Parameters<GetHistoryParams>) -> Result<CallToolResult, McpError> {
        let result = history::get_history(
            &self.database,
            &self.clock,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.limit_days,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "For each sensitivity tag, the percentage of days it was eaten that were followed by a poor or very poor stomach within the next days (default window 2)")]
    fn get_sensitivity_insights(&self, Parameters(p): Parameters<GetInsightsParams>) -> Result<CallToolResult, McpError> {
        let result = insights::get_sensitivity_insights(
            &self.database,
            &self.clock,
            self.correlation_window_days,
            p.window_days,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for FwdService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fwd".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Food & Wellness Diary".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Food & Wellness Diary (FWD) - Meal and stomach/energy logging with sensitivity insights. \
                 IMPORTANT: Call diary_instructions first. \
                 Analysis: analyze_meal (photo/description to suggested entry), evict_analysis. \
                 Food: log_food/get_food_entry/update_food_entry/delete_food_entry, list_sensitivities. \
                 Wellness: log_wellness/get_wellness_entry/update_wellness_entry/delete_wellness_entry. \
                 Browse: list_entries, get_history (per-day cards). \
                 Insights: get_sensitivity_insights."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::analyzer::HttpAnalyzer;

    fn service(dir: &tempfile::TempDir) -> FwdService {
        let config = Config::from_lookup(|key| match key {
            "FWD_TIMEZONE" => Some("UTC".to_string()),
            _ => None,
        })
        .unwrap();
        let config = Config {
            database_path: dir.path().join("fwd.db"),
            ..config
        };
        let database = Database::open_migrated(&config.database_path).unwrap();
        let analyzer = HttpAnalyzer::new("http://localhost:9", "test", None, Duration::from_secs(1)).unwrap();
        FwdService::new(&config, database, Arc::new(analyzer), Arc::new(MemoryCache::new()))
    }

    #[test]
    fn test_server_info() {
        let dir = tempfile::tempdir().unwrap();
        let info = service(&dir).get_info();
        assert_eq!(info.server_info.name, "fwd");
        assert!(info.instructions.unwrap().contains("diary_instructions"));
    }

    #[test]
    fn test_log_food_tool_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let params = LogFoodParams {
            date: Some("2025-01-09T12:30:00Z".to_string()),
            food: "Burrito".to_string(),
            ingredients: Some(IngredientsParam::Text("beans, rice, cheese".to_string())),
            sensitivities: vec!["Dairy".to_string()],
            meal_type: None,
            description: None,
        };
        assert!(svc.log_food(Parameters(params)).is_ok());

        let missing = svc.get_food_entry(Parameters(EntryIdParams { id: 42 })).unwrap();
        assert!(format!("{:?}", missing.content).contains("not found"));
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let params = LogWellnessParams {
            date: None,
            stomach: "awful".to_string(),
            energy: "low".to_string(),
            notes: None,
        };
        assert!(svc.log_wellness(Parameters(params)).is_err());
    }
}
