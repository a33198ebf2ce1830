use super::error::AgentError;
use super::types::AgentExecuteResult;
use crate::cancellation::CancellationToken;
use crate::message::TextMessage;

/// An agent that answers a batch of chat messages with one [`Response`].
///
/// [`Response`]: super::types::Response
#[async_trait::async_trait]
pub trait ChatAgent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Handle `messages` and produce a response. Implementations should
    /// stop early once `cancellation_token` is cancelled.
    async fn on_messages(
        &self,
        messages: &[TextMessage],
        cancellation_token: &CancellationToken,
    ) -> AgentExecuteResult;

    /// Like [`ChatAgent::on_messages`], but lets the caller bound how many
    /// messages the agent collects for its response. Agents without such a
    /// notion ignore the limit.
    async fn on_messages_with_limit(
        &self,
        messages: &[TextMessage],
        cancellation_token: &CancellationToken,
        message_limit: usize,
    ) -> AgentExecuteResult {
        let _ = message_limit;
        self.on_messages(messages, cancellation_token).await
    }

    /// Forget conversation state.
    async fn on_reset(&self, cancellation_token: &CancellationToken) -> Result<(), AgentError>;
}
