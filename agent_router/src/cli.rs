//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::Category;

/// Topic-aware multi-agent router
#[derive(Parser)]
#[command(name = "agent-router")]
#[command(about = "Routes free-text requests to capability-tagged agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a request to the best agent, or fan out and merge
    Route {
        /// Request text
        text: String,

        /// Skip classification and route to this category
        #[arg(long)]
        category: Option<Category>,

        /// Fan out to up to N agents and merge their responses
        #[arg(long, value_name = "N")]
        fan_out: Option<usize>,
    },
    /// List registered agents
    Agents,
    /// Show the detected topic and per-category relevance of a text
    Classify {
        text: String,
    },
    /// Run a batch of queries from a TOML file
    Batch {
        /// Path to the batch file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_with_options() {
        let cli = Cli::try_parse_from([
            "agent-router",
            "route",
            "hello there",
            "--category",
            "health",
            "--fan-out",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Route { text, category, fan_out } => {
                assert_eq!(text, "hello there");
                assert_eq!(category, Some(Category::Health));
                assert_eq!(fan_out, Some(2));
            }
            _ => panic!("expected route command"),
        }
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["agent-router", "route", "x", "--category", "astrology"]).is_err());
    }
}
