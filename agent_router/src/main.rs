//! Main entry point for the agent router CLI.

use agent_router::{
    aggregator, batch, cli, model::Category, settings::Settings, telemetry, Agent, Orchestrator,
    Request,
};
use anyhow::{anyhow, Context, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let settings = Settings::load()?;
    telemetry::init(&settings.logging)?;

    let orchestrator = Orchestrator::bootstrap(&settings);

    match args.command {
        cli::Commands::Route { text, category, fan_out } => {
            let request = Request::new(text).with_category(category.unwrap_or_default());
            let response = match fan_out {
                Some(width) => aggregator::merge(&orchestrator.route_fan_out(request, width).await),
                None => orchestrator.route_single(request).await,
            };

            print!("{}", aggregator::format_response(&response));
            if response.is_error() {
                return Err(anyhow!("Routing failed: {}", response.content));
            }
            Ok(())
        }
        cli::Commands::Agents => {
            for agent in orchestrator.registry().all() {
                let capability = agent.capability();
                let topics: Vec<_> = capability.supported_topics.iter().map(Category::as_str).collect();
                println!(
                    "{:<22} {:<28} priority={:<3} enabled={:<5} topics={}",
                    capability.id,
                    capability.name,
                    capability.priority,
                    capability.enabled,
                    topics.join(",")
                );
            }
            Ok(())
        }
        cli::Commands::Classify { text } => {
            let classifier = orchestrator.classifier();
            println!("Detected topic: {}", classifier.detect_topic(&text));
            for category in Category::ALL {
                println!(
                    "  {:<14} {:.3}",
                    category.as_str(),
                    classifier.relevance_score(&text, category)
                );
            }
            Ok(())
        }
        cli::Commands::Batch { config } => {
            let batch_config = batch::load_batch_config(&config).context("Failed to load batch configuration")?;
            let result = batch::run_batch(&orchestrator, &batch_config).await;
            batch::print_batch_summary(&result);

            if let Some(path) = batch_config.output_file.as_deref() {
                batch::save_batch_result(&result, path)?;
            }

            match result.status {
                batch::BatchStatus::Failed => Err(anyhow!("Batch {} failed", result.job_name)),
                _ => Ok(()),
            }
        }
    }
}
