//! Core coordinator that guards, classifies and routes requests to agents.

use anyhow::{anyhow, Result};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::{
    agent::{builtin_agents, Agent, SharedAgent},
    classifier::TopicClassifier,
    error::RouteError,
    guard::ContentGuard,
    model::{Category, Request, Response},
    registry::AgentRegistry,
    settings::Settings,
};

pub const DEFAULT_MAX_AGENTS: usize = 3;

/// Owns the agent registry and the gates every request passes through.
///
/// Agents are registered up front; routing never mutates the registry.
pub struct Orchestrator {
    registry: AgentRegistry,
    guard: ContentGuard,
    classifier: TopicClassifier,
    max_fan_out: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self {
            registry: AgentRegistry::new(),
            guard: ContentGuard::default(),
            classifier: TopicClassifier::default(),
            max_fan_out: DEFAULT_MAX_AGENTS,
        }
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an orchestrator with the configured guard and fan-out width.
    /// No agents are registered.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_guard(ContentGuard::new(&settings.guard.denylist))
            .with_max_fan_out(settings.orchestrator.max_fan_out)
    }

    /// [`Self::from_settings`] plus the built-in agents, when enabled.
    /// Ids listed in `agents.disabled` are registered as disabled copies.
    pub fn bootstrap(settings: &Settings) -> Self {
        let orchestrator = Self::from_settings(settings);
        if !settings.agents.enable_builtin {
            return orchestrator;
        }

        for agent in builtin_agents(settings.agents.latency_override()) {
            let agent = if settings.agents.disabled.iter().any(|id| id == agent.id()) {
                agent.into_disabled()
            } else {
                agent
            };
            orchestrator.register_agent(Arc::new(agent));
        }

        info!(agents = orchestrator.registry.len(), "Orchestrator initialized with built-in agents");
        orchestrator
    }

    pub fn with_guard(mut self, guard: ContentGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_classifier(mut self, classifier: TopicClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_fan_out(mut self, max_fan_out: usize) -> Self {
        self.max_fan_out = max_fan_out;
        self
    }

    pub fn max_fan_out(&self) -> usize {
        self.max_fan_out
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &TopicClassifier {
        &self.classifier
    }

    pub fn register_agent(&self, agent: SharedAgent) {
        self.registry.register(agent);
    }

    /// Ids of registered agents, in registration order.
    pub fn list_agents(&self) -> Vec<String> {
        self.registry.all().iter().map(|a| a.id().to_string()).collect()
    }

    /// The caller's category wins; the classifier is only asked for `General`.
    pub fn resolve_category(&self, request: &Request) -> Category {
        match request.category {
            Category::General => self.classifier.detect_topic(&request.content),
            explicit => explicit,
        }
    }

    /// Guard, classify and look up candidates. Runs once per request.
    fn admit(&self, request: &Request) -> Result<(Category, Vec<SharedAgent>), RouteError> {
        if !self.guard.is_appropriate(&request.content) {
            warn!("Rejected inappropriate content");
            return Err(RouteError::ContentRejected);
        }

        let category = self.resolve_category(request);
        tracing::Span::current().record("category", category.as_str());

        let candidates = self.registry.for_category(category);
        if candidates.is_empty() {
            warn!(%category, "No agents available");
            return Err(RouteError::NoAgentAvailable(category));
        }

        Ok((category, candidates))
    }

    /// Routes `request` to the single highest-priority capable agent.
    #[instrument(skip(self, request), fields(request_id = %request.id, category))]
    pub async fn route_single(&self, request: Request) -> Response {
        let (category, candidates) = match self.admit(&request) {
            Ok(admitted) => admitted,
            Err(e) => return e.into_response(&request.id),
        };

        let agent = &candidates[0];
        let request_id = request.id.clone();
        let routed = Request { category, ..request };
        info!(agent_id = %agent.id(), "Dispatching to agent");

        match guarded(agent.process_request(routed)).await {
            Ok(response) => response,
            Err(cause) => {
                error!(agent_id = %agent.id(), "Agent execution failed: {}", cause);
                RouteError::AgentFailed(cause).into_response(&request_id)
            }
        }
    }

    /// Routes `request` to up to `max_agents` capable agents concurrently.
    ///
    /// Every selected agent runs to completion; failures become error
    /// responses in their own slot. Responses come back in selection
    /// (priority) order, not completion order. Dropping the returned future
    /// aborts the agents still in flight.
    #[instrument(skip(self, request), fields(request_id = %request.id, category))]
    pub async fn route_fan_out(&self, request: Request, max_agents: usize) -> Vec<Response> {
        let (category, candidates) = match self.admit(&request) {
            Ok(admitted) => admitted,
            Err(e) => return vec![e.into_response(&request.id)],
        };

        let selected: Vec<SharedAgent> = candidates.into_iter().take(max_agents).collect();
        if selected.is_empty() {
            return vec![RouteError::NoAgentAvailable(category).into_response(&request.id)];
        }

        let routed = Request { category, ..request };
        info!(agents = selected.len(), "Fanning out request");

        // Dropping the set aborts whatever is still running, so a cancelled
        // call leaves no agent work behind.
        let mut tasks = JoinSet::new();
        for (slot, agent) in selected.iter().enumerate() {
            let agent = agent.clone();
            let copy = routed.clone();
            tasks.spawn(async move { (slot, guarded(agent.process_request(copy)).await) });
        }

        let mut outcomes: Vec<Option<Result<Response>>> = selected.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, outcome)) => outcomes[slot] = Some(outcome),
                Err(e) => warn!("Fan-out task did not complete: {}", e),
            }
        }

        selected
            .iter()
            .zip(outcomes)
            .map(|(agent, outcome)| {
                let outcome = outcome.unwrap_or_else(|| Err(anyhow!("agent task did not complete")));

                outcome.unwrap_or_else(|cause| {
                    let agent_name = agent.capability().name.clone();
                    error!(agent_id = %agent.id(), "Fan-out agent failed: {}", cause);
                    RouteError::FanOutAgentFailed { agent_name, cause }.into_response(&routed.id)
                })
            })
            .collect()
    }

    /// [`Self::route_fan_out`] with the configured width.
    pub async fn route_fan_out_default(&self, request: Request) -> Vec<Response> {
        self.route_fan_out(request, self.max_fan_out).await
    }
}

/// Runs an agent future, turning a panic into an error.
async fn guarded<F>(work: F) -> Result<Response>
where
    F: Future<Output = Result<Response>>,
{
    AssertUnwindSafe(work)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(anyhow!("agent panicked: {}", panic_message(&*panic))))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
