//! Routing failure taxonomy.
//!
//! Failures never escape the router as `Err`: each one is rendered into an
//! error-marked [`Response`] whose content is the error's `Display` text.

use crate::model::{Category, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    /// The content guard refused the input.
    #[error("Content not appropriate for processing")]
    ContentRejected,

    /// No registered, enabled agent supports the resolved category.
    #[error("No agents available for topic: {0}")]
    NoAgentAvailable(Category),

    /// A single-route agent failed.
    #[error("Agent processing failed: {0}")]
    AgentFailed(#[source] anyhow::Error),

    /// One agent of a fan-out failed; siblings are unaffected.
    #[error("Agent {agent_name} failed: {cause}")]
    FanOutAgentFailed {
        agent_name: String,
        #[source]
        cause: anyhow::Error,
    },
}

impl RouteError {
    pub fn into_response(self, request_id: &str) -> Response {
        Response::error(request_id, self.to_string())
    }
}
