//! Configuration management with file layering and environment overrides.

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::guard::DEFAULT_DENYLIST;
use crate::orchestrator::DEFAULT_MAX_AGENTS;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Width used when a fan-out call does not name one.
    pub max_fan_out: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_fan_out: DEFAULT_MAX_AGENTS,
        }
    }
}

/// Content guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub denylist: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Built-in agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub enable_builtin: bool,
    /// Replaces every built-in agent's simulated latency.
    pub simulated_latency_ms: Option<u64>,
    /// Built-in agent ids registered in disabled form.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl AgentsConfig {
    pub fn latency_override(&self) -> Option<Duration> {
        self.simulated_latency_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub orchestrator: OrchestratorConfig,
    pub guard: GuardConfig,
    pub agents: AgentsConfig,
}

impl Settings {
    /// Load settings from the embedded defaults, an optional local
    /// `agent_router.toml` and `ROUTER__*` environment variables.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(config::File::from_str(include_str!("../config.toml"), FileFormat::Toml))
            .add_source(config::File::with_name("agent_router").required(false))
            .add_source(
                Environment::with_prefix("ROUTER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("guard.denylist")
                    .with_list_parse_key("agents.disabled")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string layered over the embedded defaults.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(include_str!("../config.toml"), FileFormat::Toml))
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.orchestrator.max_fan_out == 0 {
            return Err(anyhow!("orchestrator.max_fan_out must be at least 1"));
        }

        if self.guard.denylist.iter().all(|term| term.trim().is_empty()) {
            return Err(anyhow!("guard.denylist must contain at least one term"));
        }

        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(anyhow!("Unsupported logging format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.orchestrator.max_fan_out, 3);
        assert_eq!(settings.guard.denylist, vec!["spam", "inappropriate", "offensive"]);
        assert!(settings.agents.enable_builtin);
        assert_eq!(settings.agents.latency_override(), None);
        assert_eq!(settings.logging.format, "text");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_toml(
            r#"
[orchestrator]
max_fan_out = 5

[agents]
simulated_latency_ms = 0
disabled = ["remote_api_agent_001"]
"#,
        )
        .unwrap();

        assert_eq!(settings.orchestrator.max_fan_out, 5);
        assert_eq!(settings.agents.latency_override(), Some(Duration::ZERO));
        assert_eq!(settings.agents.disabled, vec!["remote_api_agent_001"]);
    }

    #[test]
    fn test_validation_rejects_zero_fan_out() {
        let err = Settings::from_toml("[orchestrator]\nmax_fan_out = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_fan_out"));
    }

    #[test]
    fn test_validation_rejects_empty_denylist() {
        let mut settings = Settings::default();
        settings.guard.denylist = vec![" ".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_log_format() {
        let mut settings = Settings::default();
        settings.logging.format = "xml".to_string();
        assert!(settings.validate().is_err());
    }
}
