//! Agent registry with capability-filtered, priority-ordered lookup.

use crate::agent::{Agent, SharedAgent};
use crate::model::Category;
use parking_lot::RwLock;
use tracing::info;

/// Registered agents, kept in registration order.
///
/// Re-registering an id replaces the agent in its original slot, so ordering
/// among equal priorities stays stable across replacements.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<Vec<SharedAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `agent`, replacing any agent already registered under its id.
    pub fn register(&self, agent: SharedAgent) {
        let id = agent.id().to_string();
        let mut agents = self.agents.write();

        match agents.iter().position(|a| a.id() == id) {
            Some(position) => {
                info!(agent_id = %id, "Replacing registered agent");
                agents[position] = agent;
            }
            None => {
                info!(agent_id = %id, priority = agent.capability().priority, "Registering agent");
                agents.push(agent);
            }
        }
    }

    pub fn unregister(&self, id: &str) -> Option<SharedAgent> {
        let mut agents = self.agents.write();
        let position = agents.iter().position(|a| a.id() == id)?;
        info!(agent_id = %id, "Unregistering agent");
        Some(agents.remove(position))
    }

    pub fn get(&self, id: &str) -> Option<SharedAgent> {
        self.agents.read().iter().find(|a| a.id() == id).cloned()
    }

    pub fn all(&self) -> Vec<SharedAgent> {
        self.agents.read().clone()
    }

    /// Agents able to handle `category`, highest priority first.
    pub fn for_category(&self, category: Category) -> Vec<SharedAgent> {
        let mut candidates: Vec<SharedAgent> = self
            .agents
            .read()
            .iter()
            .filter(|a| a.can_handle(category))
            .cloned()
            .collect();

        // sort_by is stable: equal priorities keep registration order
        candidates.sort_by(|a, b| b.capability().priority.cmp(&a.capability().priority));
        candidates
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentCapability, AgentKind};
    use crate::model::{Request, Response};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Instant;

    struct StaticAgent {
        capability: AgentCapability,
        reply: &'static str,
    }

    #[async_trait]
    impl Agent for StaticAgent {
        fn capability(&self) -> &AgentCapability {
            &self.capability
        }

        async fn process_request(&self, request: Request) -> anyhow::Result<Response> {
            Ok(self.capability.respond(&request, self.reply, 0.5, Instant::now()))
        }
    }

    fn agent(id: &str, topics: &[Category], priority: i32) -> SharedAgent {
        Arc::new(StaticAgent {
            capability: AgentCapability::new(id, id, AgentKind::Custom, topics.iter().copied(), priority),
            reply: "ok",
        })
    }

    fn ids(agents: &[SharedAgent]) -> Vec<String> {
        agents.iter().map(|a| a.id().to_string()).collect()
    }

    #[test]
    fn test_for_category_orders_by_priority_then_registration() {
        let registry = AgentRegistry::new();
        registry.register(agent("low", &[Category::Science], 1));
        registry.register(agent("high_a", &[Category::Science], 9));
        registry.register(agent("mid", &[Category::Science], 5));
        registry.register(agent("high_b", &[Category::Science], 9));
        registry.register(agent("other", &[Category::Health], 100));

        assert_eq!(
            ids(&registry.for_category(Category::Science)),
            vec!["high_a", "high_b", "mid", "low"]
        );
    }

    #[test]
    fn test_for_category_skips_disabled_and_unsupported() {
        let registry = AgentRegistry::new();
        let enabled = AgentCapability::new("on", "on", AgentKind::Custom, [Category::Business], 1);
        registry.register(Arc::new(StaticAgent {
            capability: enabled,
            reply: "on",
        }));
        registry.register(Arc::new(StaticAgent {
            capability: AgentCapability::new("off", "off", AgentKind::Custom, [Category::Business], 5).disabled(),
            reply: "off",
        }));
        registry.register(agent("elsewhere", &[Category::Health], 3));

        let found = registry.for_category(Category::Business);
        assert_eq!(ids(&found), vec!["on"]);
        assert!(found.iter().all(|a| a.is_available() && a.can_handle(Category::Business)));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_register_same_id_replaces_in_place() {
        let registry = AgentRegistry::new();
        registry.register(agent("first", &[Category::General], 1));
        registry.register(Arc::new(StaticAgent {
            capability: AgentCapability::new("dup", "dup", AgentKind::Custom, [Category::General], 1),
            reply: "old",
        }));
        registry.register(agent("last", &[Category::General], 1));
        registry.register(Arc::new(StaticAgent {
            capability: AgentCapability::new("dup", "dup", AgentKind::Custom, [Category::General], 1),
            reply: "new",
        }));

        let all = registry.all();
        assert_eq!(ids(&all), vec!["first", "dup", "last"]);

        let dup = registry.get("dup").unwrap();
        let response = dup.process_request(Request::new("x")).await.unwrap();
        assert_eq!(response.content, "new");
    }

    #[test]
    fn test_unregister() {
        let registry = AgentRegistry::new();
        registry.register(agent("a", &[Category::General], 1));
        assert!(registry.unregister("missing").is_none());
        assert_eq!(registry.unregister("a").map(|a| a.id().to_string()), Some("a".to_string()));
        assert!(registry.is_empty());
        assert!(registry.for_category(Category::General).is_empty());
    }
}
