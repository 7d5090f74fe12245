//! Batch runs of pre-configured queries.
//!
//! A batch file lists queries to push through the router one after another.
//! Fan-out queries are merged before being recorded, so every query yields
//! exactly one outcome.

use crate::{
    aggregator,
    model::{Category, Request, Response},
    orchestrator::Orchestrator,
};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Batch job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub job: JobMetadata,

    pub queries: Vec<QueryConfig>,

    /// Where to write the JSON result, if anywhere
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Unique query identifier, reused as the request id
    pub id: String,

    pub content: String,

    /// Explicit category; classified when absent
    #[serde(default)]
    pub category: Option<Category>,

    /// Fan out to this many agents and merge
    #[serde(default)]
    pub fan_out: Option<usize>,
}

/// Result of a single query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query_id: String,
    pub agent_id: String,
    pub category: Category,
    pub confidence: f64,
    pub valid: bool,
    pub duration_ms: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    PartialSuccess,
    Failed,
}

/// Complete batch execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub job_name: String,
    pub status: BatchStatus,
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub total_duration_ms: u64,
    pub outcomes: Vec<QueryOutcome>,
}

/// Load batch configuration from a TOML file
pub fn load_batch_config(path: &Path) -> Result<BatchConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {:?}", path))?;

    let config: BatchConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse batch file: {:?}", path))?;

    validate_batch_config(&config)?;
    Ok(config)
}

pub fn validate_batch_config(config: &BatchConfig) -> Result<()> {
    if config.queries.is_empty() {
        return Err(anyhow!("Batch configuration must contain at least one query"));
    }

    let mut ids = HashSet::new();
    for query in &config.queries {
        if !ids.insert(query.id.as_str()) {
            return Err(anyhow!("Duplicate query ID: {}", query.id));
        }
        if query.fan_out == Some(0) {
            return Err(anyhow!("Query {} has a fan_out of 0", query.id));
        }
    }

    Ok(())
}

/// Route every query in order and collect the outcomes.
#[instrument(skip(orchestrator, config), fields(job = %config.job.name))]
pub async fn run_batch(orchestrator: &Orchestrator, config: &BatchConfig) -> BatchResult {
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(config.queries.len());

    for query in &config.queries {
        let query_started = Instant::now();
        let response = route_query(orchestrator, query).await;
        let valid = aggregator::validate(&response);

        if valid {
            info!(query_id = %query.id, agent_id = %response.agent_id, "Query routed");
        } else {
            warn!(query_id = %query.id, "Query produced no valid response: {}", response.content);
        }

        outcomes.push(QueryOutcome {
            query_id: query.id.clone(),
            agent_id: response.agent_id,
            category: response.category,
            confidence: response.confidence,
            valid,
            duration_ms: elapsed_ms(query_started),
            content: response.content,
        });
    }

    let successful_queries = outcomes.iter().filter(|o| o.valid).count();
    let failed_queries = outcomes.len() - successful_queries;
    let status = if failed_queries == 0 {
        BatchStatus::Success
    } else if successful_queries > 0 {
        BatchStatus::PartialSuccess
    } else {
        BatchStatus::Failed
    };

    BatchResult {
        job_name: config.job.name.clone(),
        status,
        total_queries: outcomes.len(),
        successful_queries,
        failed_queries,
        total_duration_ms: elapsed_ms(started),
        outcomes,
    }
}

async fn route_query(orchestrator: &Orchestrator, query: &QueryConfig) -> Response {
    let request = Request::new(query.content.clone())
        .with_id(query.id.clone())
        .with_category(query.category.unwrap_or_default());

    match query.fan_out {
        Some(width) => aggregator::merge(&orchestrator.route_fan_out(request, width).await),
        None => orchestrator.route_single(request).await,
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub fn print_batch_summary(result: &BatchResult) {
    println!("\n=== Batch Summary ===");
    println!("Job: {}", result.job_name);
    println!("Status: {:?}", result.status);
    println!("Total Queries: {}", result.total_queries);
    println!("Successful: {}", result.successful_queries);
    println!("Failed: {}", result.failed_queries);
    println!("Duration: {}ms", result.total_duration_ms);

    for outcome in &result.outcomes {
        println!(
            "  - {} -> {} [{}] {:.1}%{}",
            outcome.query_id,
            outcome.agent_id,
            outcome.category,
            outcome.confidence * 100.0,
            if outcome.valid { "" } else { " (failed)" }
        );
    }
    println!("=====================\n");
}

pub fn save_batch_result(result: &BatchResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize batch result")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write results to: {:?}", path))?;
    info!("Batch result saved to: {:?}", path);
    Ok(())
}
