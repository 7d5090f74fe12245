//! Agent Router - Core Library
//!
//! Routes free-text requests to capability-tagged agents: a content guard
//! and topic classifier gate each request, the orchestrator picks agents from
//! the registry by category and priority, and the aggregator merges fan-out
//! results into a single ranked answer.

pub mod agent;
pub mod aggregator;
pub mod batch;
pub mod classifier;
pub mod cli;
pub mod error;
pub mod guard;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod telemetry;

pub use agent::{Agent, AgentCapability, AgentKind, SharedAgent};
pub use error::RouteError;
pub use model::{Category, MetadataValue, Request, Response};
pub use orchestrator::Orchestrator;
