
use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};

/// Source tag used for messages typed by a person.
pub const USER_SOURCE: &str = "user";

/// Token accounting reported by a model for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl RequestUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self { prompt_tokens, completion_tokens }
    }

    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Accumulate another usage record into this one.
    pub fn add(&mut self, other: &RequestUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// A web source the remote agent grounded part of its answer on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCitation {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Chat message exchanged between agents (minimal: text only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    /// Who produced the message: `"user"` or an agent name.
    pub source: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_usage: Option<RequestUsage>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<UrlCitation>,
}

impl TextMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            models_usage: None,
            metadata: BTreeMap::new(),
            citations: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER_SOURCE, content)
    }

    pub fn with_usage(mut self, usage: RequestUsage) -> Self {
        self.models_usage = Some(usage);
        self
    }

    pub fn with_citations(mut self, citations: Vec<UrlCitation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Plain-text rendering, with citations listed after the content.
    pub fn to_text(&self) -> String {
        if self.citations.is_empty() {
            return self.content.clone();
        }
        let mut text = self.content.clone();
        text.push_str("\n\nSources:");
        for (i, citation) in self.citations.iter().enumerate() {
            match citation.title.as_deref() {
                Some(title) => text.push_str(&format!("\n[{}] {} <{}>", i + 1, title, citation.url)),
                None => text.push_str(&format!("\n[{}] {}", i + 1, citation.url)),
            }
        }
        text
    }
}

/// A function call the model asked the client to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// Output of one locally executed function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionExecutionResult {
    pub call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

/// Events an agent emits while working on a request. They are not part of
/// the conversation proper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    ToolCallRequest {
        source: String,
        calls: Vec<FunctionCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        models_usage: Option<RequestUsage>,
    },
    ToolCallExecution {
        source: String,
        results: Vec<FunctionExecutionResult>,
    },
    StreamingChunk {
        source: String,
        content: String,
    },
    Thought {
        source: String,
        content: String,
    },
    UserInputRequested {
        source: String,
        request_id: String,
    },
}

impl AgentEvent {
    pub fn source(&self) -> &str {
        match self {
            AgentEvent::ToolCallRequest { source, .. }
            | AgentEvent::ToolCallExecution { source, .. }
            | AgentEvent::StreamingChunk { source, .. }
            | AgentEvent::Thought { source, .. }
            | AgentEvent::UserInputRequested { source, .. } => source,
        }
    }

    /// Short type name, used as a panel title by the console.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::ToolCallRequest { .. } => "ToolCallRequestEvent",
            AgentEvent::ToolCallExecution { .. } => "ToolCallExecutionEvent",
            AgentEvent::StreamingChunk { .. } => "ModelClientStreamingChunkEvent",
            AgentEvent::Thought { .. } => "ThoughtEvent",
            AgentEvent::UserInputRequested { .. } => "UserInputRequestedEvent",
        }
    }

    pub fn models_usage(&self) -> Option<&RequestUsage> {
        match self {
            AgentEvent::ToolCallRequest { models_usage, .. } => models_usage.as_ref(),
            _ => None,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            AgentEvent::ToolCallRequest { calls, .. } => calls
                .iter()
                .map(|c| format!("{}({})", c.name, c.arguments))
                .collect::<Vec<_>>()
                .join("\n"),
            AgentEvent::ToolCallExecution { results, .. } => results
                .iter()
                .map(|r| r.content.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            AgentEvent::StreamingChunk { content, .. } | AgentEvent::Thought { content, .. } => {
                content.clone()
            }
            AgentEvent::UserInputRequested { request_id, .. } => {
                format!("user input requested ({request_id})")
            }
        }
    }
}

/// Anything that may appear in an agent's inner message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerMessage {
    Chat(TextMessage),
    Event(AgentEvent),
}

impl From<TextMessage> for InnerMessage {
    fn from(message: TextMessage) -> Self {
        InnerMessage::Chat(message)
    }
}

impl From<AgentEvent> for InnerMessage {
    fn from(event: AgentEvent) -> Self {
        InnerMessage::Event(event)
    }
}

impl fmt::Display for TextMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_has_user_source() {
        let msg = TextMessage::user("hello");
        assert_eq!(msg.source, "user");
        assert_eq!(msg.content, "hello");
        assert!(msg.models_usage.is_none());
    }

    #[test]
    fn to_text_lists_citations() {
        let msg = TextMessage::new("agent", "Employees get 15 days.").with_citations(vec![
            UrlCitation {
                url: "https://example.com/leave".to_string(),
                title: Some("Leave policy".to_string()),
            },
            UrlCitation {
                url: "https://example.com/faq".to_string(),
                title: None,
            },
        ]);
        let text = msg.to_text();
        assert!(text.starts_with("Employees get 15 days."));
        assert!(text.contains("[1] Leave policy <https://example.com/leave>"));
        assert!(text.contains("[2] https://example.com/faq"));
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let json = serde_json::to_value(TextMessage::user("hi")).unwrap();
        assert!(json.get("models_usage").is_none());
        assert!(json.get("metadata").is_none());
        assert!(json.get("citations").is_none());
    }

    #[test]
    fn usage_accumulates() {
        let mut total = RequestUsage::default();
        total.add(&RequestUsage::new(10, 5));
        total.add(&RequestUsage::new(1, 2));
        assert_eq!(total, RequestUsage::new(11, 7));
        assert_eq!(total.total_tokens(), 18);
    }

    #[test]
    fn event_kind_and_text() {
        let event = AgentEvent::ToolCallRequest {
            source: "agent".to_string(),
            calls: vec![FunctionCall {
                id: "call_1".to_string(),
                name: "get_weather".to_string(),
                arguments: r#"{"city":"Paris"}"#.to_string(),
            }],
            models_usage: None,
        };
        assert_eq!(event.kind(), "ToolCallRequestEvent");
        assert_eq!(event.source(), "agent");
        assert_eq!(event.to_text(), r#"get_weather({"city":"Paris"})"#);
    }
}
