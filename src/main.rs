//! Food & Wellness Diary (FWD)
//!
//! An MCP server for meal and wellness logging with sensitivity insights.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use fwd::analyzer::HttpAnalyzer;
use fwd::build_info;
use fwd::cache::{AnalysisCache, SqliteCache};
use fwd::config::Config;
use fwd::db;
use fwd::mcp::FwdService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fwd=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env()?;
    eprintln!("Database path: {}", config.database_path.display());
    eprintln!("Diary timezone: {}", config.clock.offset());

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database and run migrations
    eprintln!("Initializing database...");
    let database = db::Database::open_migrated(&config.database_path)?;
    let version = database.with_conn(db::migrations::get_schema_version)?;
    eprintln!("Database schema version: {}", version);

    let cache = SqliteCache::new(database.clone());
    match cache.purge_expired() {
        Ok(0) => {}
        Ok(n) => tracing::info!("Purged {} expired analysis cache entries", n),
        Err(e) => tracing::warn!("Failed to purge analysis cache: {}", e),
    }

    let analyzer = HttpAnalyzer::new(
        &config.analyzer_url,
        &config.analyzer_model,
        config.analyzer_api_key.clone(),
        config.analyzer_timeout,
    )?;
    if !analyzer.is_configured() {
        tracing::warn!("FWD_ANALYZER_API_KEY is not set; analyze_meal will be unavailable");
    }

    // Create the FWD service
    let service = FwdService::new(&config, database, Arc::new(analyzer), Arc::new(cache));

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
