//! Tool definitions understood by the remote agent service.
//!
//! The service owns their semantics; the client only assembles the JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::error::ToolError;
use super::schema::ToolSchema;
use super::traits::Tool;

/// An opaque, provider-defined tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolDefinition(Value);

impl ToolDefinition {
    /// Wrap a raw definition. It must be an object with a string `type`.
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        match value.get("type").and_then(Value::as_str) {
            Some(kind) if !kind.is_empty() => Ok(Self(value)),
            _ => Err(ToolError::InvalidDefinition(format!(
                "tool definition needs a non-empty string `type`: {value}"
            ))),
        }
    }

    /// Definition of a client-side function backed by `tool`.
    pub fn function(tool: &dyn Tool) -> Self {
        let schema = ToolSchema {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            args: tool.args(),
        };
        Self(json!({
            "type": "function",
            "function": {
                "name": schema.name,
                "description": schema.description,
                "parameters": schema.parameters(),
            }
        }))
    }

    pub fn code_interpreter() -> Self {
        Self(json!({ "type": "code_interpreter" }))
    }

    /// The `type` discriminator, e.g. `bing_grounding` or `function`.
    pub fn kind(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Web search grounding through a Bing connection of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingGroundingTool {
    pub connection_id: String,
    pub count: Option<u32>,
    pub freshness: Option<String>,
    pub market: Option<String>,
    pub set_lang: Option<String>,
}

impl BingGroundingTool {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            count: None,
            freshness: None,
            market: None,
            set_lang: None,
        }
    }

    /// Number of search results to return.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Freshness filter: `Day`, `Week`, `Month` or a date range.
    pub fn with_freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = Some(freshness.into());
        self
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn with_set_lang(mut self, set_lang: impl Into<String>) -> Self {
        self.set_lang = Some(set_lang.into());
        self
    }

    pub fn definition(&self) -> ToolDefinition {
        let mut config = json!({ "connection_id": self.connection_id });
        if let Some(count) = self.count {
            config["count"] = json!(count);
        }
        if let Some(freshness) = &self.freshness {
            config["freshness"] = json!(freshness);
        }
        if let Some(market) = &self.market {
            config["market"] = json!(market);
        }
        if let Some(set_lang) = &self.set_lang {
            config["set_lang"] = json!(set_lang);
        }
        ToolDefinition(json!({
            "type": "bing_grounding",
            "bing_grounding": { "search_configurations": [config] }
        }))
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![self.definition()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bing_definition_shape() {
        let def = BingGroundingTool::new("/subscriptions/s/connections/bing").definition();
        assert_eq!(def.kind(), "bing_grounding");
        let config = &def.as_value()["bing_grounding"]["search_configurations"][0];
        assert_eq!(config["connection_id"], "/subscriptions/s/connections/bing");
        assert!(config.get("count").is_none());
    }

    #[test]
    fn bing_optional_settings() {
        let def = BingGroundingTool::new("conn")
            .with_count(5)
            .with_freshness("Week")
            .with_market("en-US")
            .with_set_lang("en")
            .definition();
        let config = &def.as_value()["bing_grounding"]["search_configurations"][0];
        assert_eq!(config["count"], 5);
        assert_eq!(config["freshness"], "Week");
        assert_eq!(config["market"], "en-US");
        assert_eq!(config["set_lang"], "en");
    }

    #[test]
    fn from_value_requires_type() {
        assert!(ToolDefinition::from_value(json!({ "type": "file_search" })).is_ok());
        assert!(matches!(
            ToolDefinition::from_value(json!({ "name": "x" })),
            Err(ToolError::InvalidDefinition(_))
        ));
        assert!(ToolDefinition::from_value(json!({ "type": "" })).is_err());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_value(ToolDefinition::code_interpreter()).unwrap();
        assert_eq!(json, json!({ "type": "code_interpreter" }));
    }
}
