// Wire types of the agent service REST API. Only the fields we read are
// modelled; everything else is ignored on deserialization.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{RequestUsage, UrlCitation};

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAgent {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThread {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRun {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<RunError>,
    #[serde(default)]
    pub usage: Option<RunUsage>,
}

impl ApiRun {
    /// Function calls the service is waiting on, if any.
    pub fn pending_tool_calls(&self) -> Vec<RequiredToolCall> {
        self.required_action
            .as_ref()
            .and_then(|a| a.submit_tool_outputs.as_ref())
            .map(|s| s.tool_calls.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub submit_tool_outputs: Option<SubmitToolOutputs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<RequiredToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub function: Option<RequiredFunction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RunUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl From<RunUsage> for RequestUsage {
    fn from(usage: RunUsage) -> Self {
        RequestUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

#[derive(Debug, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiMessageList {
    #[serde(default)]
    pub data: Vec<ApiThreadMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThreadMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<ApiMessageContent>,
}

impl ApiThreadMessage {
    /// Concatenated text parts and the URL citations attached to them.
    pub fn text_and_citations(&self) -> (String, Vec<UrlCitation>) {
        let mut text = String::new();
        let mut citations = Vec::new();
        for part in &self.content {
            if let ApiMessageContent::Text { text: body } = part {
                text.push_str(&body.value);
                for annotation in &body.annotations {
                    if let ApiAnnotation::UrlCitation { url_citation, .. } = annotation {
                        let citation = UrlCitation {
                            url: url_citation.url.clone(),
                            title: url_citation.title.clone(),
                        };
                        if !citations.contains(&citation) {
                            citations.push(citation);
                        }
                    }
                }
            }
        }
        (text, citations)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiMessageContent {
    Text { text: ApiText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<ApiAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiAnnotation {
    UrlCitation {
        #[serde(default)]
        text: Option<String>,
        url_citation: ApiUrlCitation,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUrlCitation {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Raw connection record returned by `/connections/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiConnection {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, rename = "isDefault")]
    pub is_default: bool,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_run_status_is_tolerated() {
        let run: ApiRun = serde_json::from_str(r#"{"id":"run_1","status":"paused"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
    }

    #[test]
    fn pending_tool_calls_are_extracted() {
        let run: ApiRun = serde_json::from_str(
            r#"{
                "id": "run_1",
                "status": "requires_action",
                "required_action": {
                    "type": "submit_tool_outputs",
                    "submit_tool_outputs": {"tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "f", "arguments": "{}"}}
                    ]}
                }
            }"#,
        )
        .unwrap();
        let calls = run.pending_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.as_ref().unwrap().name, "f");
    }

    #[test]
    fn text_and_citations_are_collected() {
        let message: ApiThreadMessage = serde_json::from_str(
            r#"{
                "id": "msg_1",
                "role": "assistant",
                "content": [
                    {"type": "text", "text": {"value": "15 days [1]", "annotations": [
                        {"type": "url_citation", "text": "[1]", "url_citation": {"url": "https://a.example", "title": "A"}},
                        {"type": "url_citation", "text": "[2]", "url_citation": {"url": "https://a.example", "title": "A"}},
                        {"type": "file_citation", "text": "[3]"}
                    ]}},
                    {"type": "image_file", "image_file": {"file_id": "f"}}
                ]
            }"#,
        )
        .unwrap();
        let (text, citations) = message.text_and_citations();
        assert_eq!(text, "15 days [1]");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].url, "https://a.example");
    }
}
