use async_stream::stream;
use futures::stream::BoxStream;

use crate::cancellation::CancellationToken;
use crate::message::{InnerMessage, TextMessage};

pub mod types;
pub mod error;
pub mod traits;
pub mod code_executor;

use error::AgentError;
use traits::ChatAgent;
use types::{StreamItem, TaskResult};

pub use code_executor::CodeExecutorAgent;

/// Stream the result of [`ChatAgent::on_messages`]: every inner message in
/// order, then the final `Response`.
pub fn on_messages_stream<'a>(
    agent: &'a dyn ChatAgent,
    messages: &'a [TextMessage],
    cancellation_token: &'a CancellationToken,
) -> BoxStream<'a, Result<StreamItem, AgentError>> {
    Box::pin(stream! {
        match agent.on_messages(messages, cancellation_token).await {
            Ok(response) => {
                for inner in response.inner_messages.iter().cloned() {
                    yield Ok(StreamItem::from(inner));
                }
                yield Ok(StreamItem::Response(response));
            }
            Err(e) => yield Err(e),
        }
    })
}

/// Run `task` as a one-shot task against `agent`.
///
/// Yields the task message, the agent's inner messages, its final message,
/// and finally a `TaskResult` holding all of them.
pub fn run_stream<'a>(
    agent: &'a dyn ChatAgent,
    task: &'a str,
    cancellation_token: &'a CancellationToken,
) -> BoxStream<'a, Result<StreamItem, AgentError>> {
    Box::pin(stream! {
        let task_message = TextMessage::user(task);
        let mut transcript = vec![InnerMessage::Chat(task_message.clone())];
        yield Ok(StreamItem::Message(task_message.clone()));

        let messages = [task_message];
        match agent.on_messages(&messages, cancellation_token).await {
            Ok(response) => {
                for inner in response.inner_messages {
                    transcript.push(inner.clone());
                    yield Ok(StreamItem::from(inner));
                }
                transcript.push(InnerMessage::Chat(response.chat_message.clone()));
                yield Ok(StreamItem::Message(response.chat_message));
                yield Ok(StreamItem::TaskResult(TaskResult {
                    messages: transcript,
                    stop_reason: None,
                }));
            }
            Err(e) => yield Err(e),
        }
    })
}
