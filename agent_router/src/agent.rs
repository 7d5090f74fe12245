use crate::model::{clamp_confidence, keys, Category, Metadata, MetadataValue, Request, Response};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Worker-kind tag carried by every capability descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    TextProcessor,
    ContentAnalyzer,
    QuestionAnswerer,
    ConversationHandler,
    Custom,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::TextProcessor => "TEXT_PROCESSOR",
            AgentKind::ContentAnalyzer => "CONTENT_ANALYZER",
            AgentKind::QuestionAnswerer => "QUESTION_ANSWERER",
            AgentKind::ConversationHandler => "CONVERSATION_HANDLER",
            AgentKind::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor identifying an agent and what it can serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapability {
    pub id: String,
    pub name: String,
    pub kind: AgentKind,
    pub supported_topics: BTreeSet<Category>,
    pub priority: i32,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub properties: Metadata,
}

impl AgentCapability {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AgentKind,
        supported_topics: impl IntoIterator<Item = Category>,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            supported_topics: supported_topics.into_iter().collect(),
            priority,
            enabled: true,
            endpoint: None,
            api_key: None,
            properties: Metadata::new(),
        }
    }

    /// Descriptor for a generalist agent serving every category.
    pub fn generalist(id: impl Into<String>, name: impl Into<String>, kind: AgentKind, priority: i32) -> Self {
        Self::new(id, name, kind, Category::ALL, priority)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.api_key = api_key;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// A disabled copy of this descriptor. Agents are disabled by registering
    /// a replacement built from this copy, never by mutating a live one.
    pub fn disabled(&self) -> Self {
        Self {
            enabled: false,
            ..self.clone()
        }
    }

    /// Builds a response for `request` stamped with this agent's identity.
    ///
    /// Confidence is clamped into `[0, 1]` and the processing time is the
    /// time elapsed since `started`.
    pub fn respond(
        &self,
        request: &Request,
        content: impl Into<String>,
        confidence: f64,
        started: Instant,
    ) -> Response {
        let mut metadata = Metadata::new();
        metadata.insert(keys::AGENT_NAME.to_string(), MetadataValue::from(self.name.as_str()));
        metadata.insert(keys::AGENT_TYPE.to_string(), MetadataValue::from(self.kind.as_str()));

        Response {
            id: request.id.clone(),
            agent_id: self.id.clone(),
            content: content.into(),
            confidence: clamp_confidence(confidence),
            category: request.category,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            metadata,
        }
    }
}

/// Contract every worker satisfies. The router treats implementations as
/// opaque: it only reads the capability and calls `process_request`.
#[async_trait]
pub trait Agent: Send + Sync {
    fn capability(&self) -> &AgentCapability;

    /// Produces a response for a request already carrying its resolved
    /// category. Failures are converted to error responses by the router.
    async fn process_request(&self, request: Request) -> Result<Response>;

    fn id(&self) -> &str {
        &self.capability().id
    }

    fn can_handle(&self, category: Category) -> bool {
        let capability = self.capability();
        capability.supported_topics.contains(&category) && capability.enabled
    }

    fn is_available(&self) -> bool {
        self.capability().enabled
    }
}

// --- Built-in Agents ---

/// How a simulated agent renders its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    TextProcessing,
    ContentAnalysis,
    QuestionAnswering,
    HealthAdvice,
    BusinessAnalysis,
    RemoteApi,
}

/// Stand-in worker that sleeps for a fixed latency and returns canned,
/// request-aware content at a fixed confidence.
pub struct SimulatedAgent {
    capability: AgentCapability,
    script: Script,
    confidence: f64,
    latency: Duration,
}

impl SimulatedAgent {
    fn new(capability: AgentCapability, script: Script, confidence: f64, latency_ms: u64) -> Self {
        Self {
            capability,
            script,
            confidence,
            latency: Duration::from_millis(latency_ms),
        }
    }

    pub fn text_processor() -> Self {
        Self::new(
            AgentCapability::new(
                "text_processor_001",
                "Advanced Text Processor",
                AgentKind::TextProcessor,
                [Category::General, Category::Technology, Category::Education],
                10,
            ),
            Script::TextProcessing,
            0.85,
            500,
        )
    }

    pub fn content_analyzer() -> Self {
        Self::new(
            AgentCapability::new(
                "content_analyzer_001",
                "Content Analyzer Pro",
                AgentKind::ContentAnalyzer,
                [Category::Business, Category::Science, Category::General],
                8,
            ),
            Script::ContentAnalysis,
            0.92,
            700,
        )
    }

    pub fn question_answerer() -> Self {
        Self::new(
            AgentCapability::generalist("qa_agent_001", "Q&A Specialist", AgentKind::QuestionAnswerer, 9),
            Script::QuestionAnswering,
            0.88,
            600,
        )
    }

    pub fn health_advisor() -> Self {
        Self::new(
            AgentCapability::new(
                "health_agent_001",
                "Health & Wellness Advisor",
                AgentKind::Custom,
                [Category::Health],
                9,
            ),
            Script::HealthAdvice,
            0.87,
            800,
        )
    }

    pub fn business_analyst() -> Self {
        Self::new(
            AgentCapability::new(
                "business_agent_001",
                "Business Strategy Analyst",
                AgentKind::Custom,
                [Category::Business, Category::General],
                8,
            ),
            Script::BusinessAnalysis,
            0.91,
            600,
        )
    }

    pub fn remote_api() -> Self {
        Self::new(
            AgentCapability::generalist(
                "remote_api_agent_001",
                "External API Integrator",
                AgentKind::Custom,
                5,
            )
            .with_endpoint("https://api.example.com/v1/ai", Some("demo_api_key".to_string())),
            Script::RemoteApi,
            0.89,
            1_200,
        )
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replaces the descriptor with its disabled copy.
    pub fn into_disabled(mut self) -> Self {
        self.capability = self.capability.disabled();
        self
    }

    fn render(&self, request: &Request) -> String {
        let topic = request.category;
        let content = &request.content;

        match self.script {
            Script::TextProcessing => match topic {
                Category::Technology => format!(
                    "Technical Analysis: {}. This appears to be technology-related content that requires specialized processing.",
                    content
                ),
                Category::Education => format!(
                    "Educational Insight: {}. Here's a learning-focused perspective on your query.",
                    content
                ),
                _ => format!(
                    "Processed Content: {}. I've analyzed your text and provided this enhanced response.",
                    content
                ),
            },
            Script::ContentAnalysis => format!(
                "Content Analysis Report:\n\
                 - Topic: {topic}\n\
                 - Word Count: {}\n\
                 - Key Insights: This content shows good structure and relevance to the {topic} domain.\n\
                 - Recommendations: Consider expanding on the main points for better clarity.",
                content.split_whitespace().count()
            ),
            Script::QuestionAnswering => {
                if content.contains('?') {
                    format!(
                        "Answer: Based on your question about {topic}, here's what I found. \
                         The information is tailored to the {topic} domain and provides actionable insights."
                    )
                } else {
                    format!(
                        "Information: While this wasn't phrased as a question, here is relevant information about {topic}. \
                         Your content relates to important aspects of this field."
                    )
                }
            }
            Script::HealthAdvice => format!(
                "Health & Wellness Analysis\n\n\
                 Query: {content}\n\n\
                 Health Insights:\n\
                 - Always consult with healthcare professionals for medical advice\n\
                 - Consider lifestyle factors that may be relevant\n\
                 - Stay informed about evidence-based health practices\n\n\
                 Disclaimer: This is generated information and does not replace professional medical advice."
            ),
            Script::BusinessAnalysis => format!(
                "Business Analysis Report\n\n\
                 Query: {content}\n\n\
                 Business Perspective:\n\
                 - Market Context: This query relates to current business trends\n\
                 - Strategic Implications: Consider long-term impact on operations\n\
                 - Risk Assessment: Evaluate potential challenges and opportunities\n\n\
                 Recommendations:\n\
                 - Conduct thorough market research\n\
                 - Develop a clear implementation strategy\n\
                 - Monitor key performance indicators"
            ),
            Script::RemoteApi => format!(
                "External API Integration Response\n\n\
                 Endpoint: {}\n\
                 Topic: {topic}\n\
                 Processing Method: Remote API Call (simulated)",
                self.capability.endpoint.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

#[async_trait]
impl Agent for SimulatedAgent {
    fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    #[instrument(skip(self, request), fields(agent = %self.capability.id, request_id = %request.id))]
    async fn process_request(&self, request: Request) -> Result<Response> {
        let started = Instant::now();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let content = self.render(&request);
        debug!("Simulated agent produced {} bytes", content.len());
        Ok(self.capability.respond(&request, content, self.confidence, started))
    }
}

/// The built-in agent set, in registration order.
///
/// `latency_override` replaces every agent's simulated latency when set.
pub fn builtin_agents(latency_override: Option<Duration>) -> Vec<SimulatedAgent> {
    let agents = vec![
        SimulatedAgent::text_processor(),
        SimulatedAgent::content_analyzer(),
        SimulatedAgent::question_answerer(),
        SimulatedAgent::health_advisor(),
        SimulatedAgent::business_analyst(),
        SimulatedAgent::remote_api(),
    ];

    match latency_override {
        Some(latency) => agents.into_iter().map(|a| a.with_latency(latency)).collect(),
        None => agents,
    }
}

/// Shared handle type the registry stores.
pub type SharedAgent = Arc<dyn Agent>;
