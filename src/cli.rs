//! CLI helper functions

use crate::{
    client::{ClientOptions, DEFAULT_BASE_URL, StatsClient},
    config::{Definitions, Entity, PipelineDefinition, RunContext},
    runner::{RunSummary, run_all},
    sink::{Credential, DuckDbSink, Sink, SinkConnection},
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default sink when `NBA_ETL_DATABASE` is unset
pub const DEFAULT_DATABASE: &str = "md:nba_data_staging";

/// Default season when `NBA_ETL_SEASON` is unset
pub const DEFAULT_SEASON: &str = "2024-25";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_number(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid {}: {}", name, value)),
        _ => Ok(None),
    }
}

/// Load the stats API client from environment variables
///
/// Expected environment variables:
/// - NBA_STATS_URL: API base URL (optional, defaults to https://stats.nba.com/stats/)
/// - NBA_STATS_TIMEOUT_SECS: per-request timeout (optional, defaults to 30)
/// - NBA_STATS_MAX_RETRIES: retries for transient failures (optional, defaults to 2)
pub fn load_stats_client() -> Result<StatsClient> {
    let url_str = env_or("NBA_STATS_URL", DEFAULT_BASE_URL);
    let url =
        Url::parse(&url_str).with_context(|| format!("Invalid NBA_STATS_URL: {}", url_str))?;

    let mut options = ClientOptions::new(url);
    if let Some(secs) = env_number("NBA_STATS_TIMEOUT_SECS")? {
        options.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = env_number("NBA_STATS_MAX_RETRIES")? {
        options.max_retries =
            u32::try_from(retries).context("NBA_STATS_MAX_RETRIES is too large")?;
    }

    StatsClient::try_new(options).context("Failed to create stats client")
}

/// The sink database named by `NBA_ETL_DATABASE`
pub fn load_sink() -> DuckDbSink {
    DuckDbSink::new(env_or("NBA_ETL_DATABASE", DEFAULT_DATABASE))
}

/// Season from `NBA_ETL_SEASON`, with the current time
pub fn run_context_from_env() -> RunContext {
    RunContext::new(env_or("NBA_ETL_SEASON", DEFAULT_SEASON), chrono::Utc::now())
}

/// Built-in pipeline definitions, overridden from `dir` when given
pub fn load_definitions(dir: Option<&Path>) -> Result<Definitions> {
    match dir {
        Some(dir) => {
            log::info!("Loading pipeline definitions from {}", dir.display());
            Definitions::from_dir(dir)
        }
        None => Definitions::builtin(),
    }
}

/// Run the given entities' pipelines (all of them when empty)
pub async fn run_pipelines(entities: &[Entity], pipelines: Option<&Path>) -> Result<RunSummary> {
    let entities = if entities.is_empty() {
        Entity::ALL.to_vec()
    } else {
        entities.to_vec()
    };

    let definitions = load_definitions(pipelines)?;
    let client = Arc::new(load_stats_client()?);
    let sink = load_sink();
    let credential = Credential::from_env();
    let context = run_context_from_env();

    log::info!(
        "Loading {} into {} for season {}",
        entities
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ")
            .cyan(),
        sink.database().bright_black(),
        context.season
    );

    let summary = run_all(&entities, &definitions, &context, client, sink, &credential).await?;

    for (entity, report) in &summary.reports {
        log::info!(
            "{} {}: {} rows into {} (primary key {})",
            "✓".green(),
            entity,
            report.rows,
            report.table,
            report.key
        );
    }
    for (entity, error) in &summary.failures {
        log::error!("{} {}: [{}] {}", "✗".red(), entity, error.kind(), error);
    }

    Ok(summary)
}

/// Open and close a connection to the sink to verify the credential
pub fn check_sink() -> crate::error::Result<()> {
    let sink = load_sink();
    let credential = Credential::from_env();
    log::info!("Connecting to {}", sink.database().bright_black());

    sink.open(&credential)?.close()?;

    log::info!("{} Connected to {}", "✓".green(), sink.database());
    Ok(())
}

/// Plain-text listing of a definition's columns
pub fn describe_columns(definition: &PipelineDefinition) -> Vec<String> {
    let mut lines: Vec<String> = definition
        .columns
        .iter()
        .map(|(source, destination)| format!("{} -> {}", source, destination))
        .collect();
    lines.extend(definition.drop.iter().map(|c| format!("{} (dropped)", c)));
    lines.extend(
        definition
            .derived
            .iter()
            .map(|d| format!("{} (derived from {})", d.name, d.template)),
    );
    lines
}

/// Print an entity's column mapping to stdout
pub fn print_columns(entity: Entity, pipelines: Option<&Path>) -> Result<()> {
    let definitions = load_definitions(pipelines)?;
    let definition = definitions
        .get(entity)
        .ok_or_else(|| eyre::eyre!("No pipeline definition for {}", entity))?;

    println!(
        "{} -> {} (key {})",
        definition.source.endpoint.cyan(),
        definition.table.green(),
        definition.key.bold()
    );
    for line in describe_columns(definition) {
        println!("  {}", line);
    }
    Ok(())
}
