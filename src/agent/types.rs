use serde::{Serialize, Deserialize};

use super::error::AgentError;
use crate::message::{AgentEvent, InnerMessage, TextMessage};

/// What an agent returns for one `on_messages` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The final message of the exchange.
    pub chat_message: TextMessage,
    /// Events and intermediate messages produced on the way, oldest first.
    #[serde(default)]
    pub inner_messages: Vec<InnerMessage>,
}

impl Response {
    pub fn new(chat_message: TextMessage) -> Self {
        Self {
            chat_message,
            inner_messages: Vec::new(),
        }
    }

    pub fn with_inner_messages(mut self, inner_messages: Vec<InnerMessage>) -> Self {
        self.inner_messages = inner_messages;
        self
    }
}

/// Outcome of running a whole task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskResult {
    pub messages: Vec<InnerMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// One item of an agent's output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(AgentEvent),
    Message(TextMessage),
    Response(Response),
    TaskResult(TaskResult),
}

impl From<InnerMessage> for StreamItem {
    fn from(inner: InnerMessage) -> Self {
        match inner {
            InnerMessage::Chat(message) => StreamItem::Message(message),
            InnerMessage::Event(event) => StreamItem::Event(event),
        }
    }
}

pub type AgentExecuteResult = Result<Response, AgentError>;
