//! Request/response value types shared by the router, agents and aggregator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Agent id stamped on responses the router itself produces.
pub const SYSTEM_AGENT_ID: &str = "system";

/// Agent id stamped on merged responses.
pub const AGGREGATED_AGENT_ID: &str = "aggregated";

/// Reserved metadata keys.
pub mod keys {
    pub const ERROR: &str = "error";
    pub const AGGREGATED: &str = "aggregated";
    pub const AGENT_COUNT: &str = "agentCount";
    pub const BEST_AGENT_ID: &str = "bestAgentId";
    pub const AGENT_NAME: &str = "agentName";
    pub const AGENT_TYPE: &str = "agentType";
}

/// Topic categories requests are routed by.
///
/// `General` doubles as the "unset" value on incoming requests: the router
/// asks the classifier whenever it sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technology,
    Science,
    Business,
    Education,
    Entertainment,
    Health,
    General,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 7] = [
        Category::Technology,
        Category::Science,
        Category::Business,
        Category::Education,
        Category::Entertainment,
        Category::Health,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "TECHNOLOGY",
            Category::Science => "SCIENCE",
            Category::Business => "BUSINESS",
            Category::Education => "EDUCATION",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Health => "HEALTH",
            Category::General => "GENERAL",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::General
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", s))
    }
}

/// Scalar values allowed in request/response metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

pub type Metadata = HashMap<String, MetadataValue>;

/// A free-text request entering the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Request {
    /// Creates a request with a generated id and an unset (`General`) category.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            category: Category::General,
            metadata: Metadata::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The outcome of routing a request: either an agent's answer, a merged
/// answer, or an error shaped exactly like an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub agent_id: String,
    pub content: String,
    pub confidence: f64,
    pub category: Category,
    pub processing_time_ms: u64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Response {
    /// Builds the error-marked response used for every routing failure.
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(keys::ERROR.to_string(), MetadataValue::Bool(true));
        Self {
            id: request_id.into(),
            agent_id: SYSTEM_AGENT_ID.to_string(),
            content: message.into(),
            confidence: 0.0,
            category: Category::General,
            processing_time_ms: 0,
            metadata,
        }
    }

    pub fn is_error(&self) -> bool {
        self.metadata.contains_key(keys::ERROR)
    }

    /// Display name of the producing agent, falling back to its id.
    pub fn agent_display_name(&self) -> &str {
        self.metadata
            .get(keys::AGENT_NAME)
            .and_then(MetadataValue::as_str)
            .unwrap_or(&self.agent_id)
    }
}

/// Clamps a confidence into `[0.0, 1.0]`; NaN becomes 0.0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("technology".parse::<Category>().unwrap(), Category::Technology);
        assert_eq!(" HEALTH ".parse::<Category>().unwrap(), Category::Health);
        assert!("astrology".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_display_is_upper_case() {
        assert_eq!(Category::Entertainment.to_string(), "ENTERTAINMENT");
        assert_eq!(Category::default(), Category::General);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = Request::new("hello");
        let b = Request::new("hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.category, Category::General);
    }

    #[test]
    fn test_error_response_shape() {
        let r = Response::error("req-1", "boom");
        assert_eq!(r.id, "req-1");
        assert_eq!(r.agent_id, SYSTEM_AGENT_ID);
        assert_eq!(r.confidence, 0.0);
        assert!(r.is_error());
        assert_eq!(r.metadata.get(keys::ERROR), Some(&MetadataValue::Bool(true)));
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.5), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_metadata_serializes_as_plain_scalars() {
        let r = Response::error("x", "y");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["metadata"]["error"], serde_json::json!(true));
        assert_eq!(json["category"], serde_json::json!("general"));
    }
}
