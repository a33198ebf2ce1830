use std::collections::BTreeMap;

use serde::Deserialize;

use crate::azure::agent::AgentConfig;
use crate::tools::definition::ToolDefinition;

pub const DEFAULT_API_VERSION: &str = "2025-05-01";
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_AGENT_NAME: &str = "web-search-agent";
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

/// Settings for building a web-search agent against an Azure AI project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Project endpoint, e.g. `https://<resource>.services.ai.azure.com/api/projects/<project>`.
    pub project_endpoint: String,
    /// Name of the pre-provisioned Bing grounding connection.
    pub bing_connection_name: String,
    #[serde(default = "default_deployment")]
    pub model_deployment_name: String,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[serde(default)]
    pub agent_description: String,
    #[serde(default = "default_instructions")]
    pub agent_instructions: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Key/value pairs attached to the remote agent.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_deployment() -> String {
    DEFAULT_DEPLOYMENT.to_string()
}

fn default_agent_name() -> String {
    DEFAULT_AGENT_NAME.to_string()
}

fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps an environment variable
    /// name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ConfigError::MissingConfig(key.to_string()))
        };
        let settings = Self {
            project_endpoint: required("PROJECT_ENDPOINT")?,
            bing_connection_name: required("BING_CONNECTION_NAME")?,
            model_deployment_name: lookup("MODEL_DEPLOYMENT_NAME").unwrap_or_else(default_deployment),
            agent_name: lookup("AGENT_NAME").unwrap_or_else(default_agent_name),
            agent_description: lookup("AGENT_DESCRIPTION").unwrap_or_default(),
            agent_instructions: lookup("AGENT_INSTRUCTIONS").unwrap_or_else(default_instructions),
            api_version: lookup("AZURE_AI_API_VERSION").unwrap_or_else(default_api_version),
            metadata: match lookup("AGENT_METADATA") {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| ConfigError::InvalidConfig(format!("AGENT_METADATA: {e}")))?,
                None => BTreeMap::new(),
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML document with snake_case keys.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(source).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Every field the agent call depends on must be populated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("project_endpoint", &self.project_endpoint),
            ("bing_connection_name", &self.bing_connection_name),
            ("model_deployment_name", &self.model_deployment_name),
            ("agent_name", &self.agent_name),
            ("agent_instructions", &self.agent_instructions),
            ("api_version", &self.api_version),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingConfig(name.to_string()));
            }
        }
        if !self.project_endpoint.starts_with("http://") && !self.project_endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidConfig(format!(
                "project_endpoint must be an http(s) URL, got {:?}",
                self.project_endpoint
            )));
        }
        Ok(())
    }

    /// Agent configuration carrying these settings and the given tools.
    pub fn agent_config(&self, tools: Vec<ToolDefinition>) -> AgentConfig {
        self.metadata.iter().fold(
            AgentConfig::new(&self.agent_name, &self.model_deployment_name, &self.agent_instructions)
                .with_description(&self.agent_description)
                .with_tools(tools),
            |config, (key, value)| config.with_metadata(key, value),
        )
    }
}
