use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::{Mutex, OnceCell};

use super::error::AzureError;
use super::project::ProjectClient;
use super::types::{ApiAgent, ApiMessageList, ApiRun, ApiThread, RequiredToolCall, RunStatus, ToolOutput};
use crate::agent::error::AgentError;
use crate::agent::traits::ChatAgent;
use crate::agent::types::{AgentExecuteResult, Response};
use crate::cancellation::{CancelAware, CancellationToken, await_or_cancel};
use crate::message::{AgentEvent, FunctionCall, FunctionExecutionResult, InnerMessage, TextMessage};
use crate::tools::definition::ToolDefinition;
use crate::tools::error::ToolError;
use crate::tools::traits::Tool;

/// Number of thread messages collected per call unless the caller says
/// otherwise.
pub const DEFAULT_MESSAGE_LIMIT: usize = 1;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Everything the remote agent is created from. Immutable once the agent
/// handle owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    /// Model deployment the remote agent runs on.
    pub deployment: String,
    pub instructions: String,
    pub tools: Vec<ToolDefinition>,
    pub metadata: BTreeMap<String, String>,
}

impl AgentConfig {
    pub fn new(
        name: impl Into<String>,
        deployment: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            deployment: deployment.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Request body for creating the remote agent.
    fn create_body(&self) -> Value {
        json!({
            "model": self.deployment,
            "name": self.name,
            "description": self.description,
            "instructions": self.instructions,
            "tools": self.tools,
            "metadata": self.metadata,
        })
    }
}

/// A chat agent hosted by the Azure AI Foundry agent service.
///
/// The remote agent and its conversation thread are created lazily on the
/// first call. Grounding tools such as Bing search run remotely; function
/// tools registered with [`AzureAiAgent::register_tool`] run locally when a
/// run asks for them.
pub struct AzureAiAgent {
    config: AgentConfig,
    project: Arc<ProjectClient>,
    function_tools: HashMap<String, Arc<dyn Tool>>,
    poll_interval: Duration,
    agent_id: OnceCell<String>,
    thread_id: Mutex<Option<String>>,
}

impl AzureAiAgent {
    pub fn new(config: AgentConfig, project: Arc<ProjectClient>) -> Self {
        Self {
            config,
            project,
            function_tools: HashMap::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            agent_id: OnceCell::new(),
            thread_id: Mutex::new(None),
        }
    }

    /// Register a local function tool. Its definition is appended to the
    /// configured tools so the remote agent can call it.
    pub fn register_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.config.tools.push(ToolDefinition::function(tool.as_ref()));
        self.function_tools.insert(tool.name().to_string(), tool);
        self
    }

    /// How long to wait between run status checks.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Id of the remote agent, once created.
    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.get().map(String::as_str)
    }

    pub async fn thread_id(&self) -> Option<String> {
        self.thread_id.lock().await.clone()
    }

    async fn ensure_agent(&self) -> Result<String, AzureError> {
        let id = self
            .agent_id
            .get_or_try_init(|| async {
                let created: ApiAgent = self.project.post(&["assistants"], &self.config.create_body()).await?;
                tracing::info!(agent = %self.config.name, id = %created.id, "created remote agent");
                Ok::<_, AzureError>(created.id)
            })
            .await?;
        Ok(id.clone())
    }

    async fn ensure_thread(&self) -> Result<String, AzureError> {
        let mut slot = self.thread_id.lock().await;
        if let Some(id) = slot.as_ref() {
            return Ok(id.clone());
        }
        let thread: ApiThread = self.project.post(&["threads"], &json!({})).await?;
        tracing::debug!(thread = %thread.id, "created thread");
        *slot = Some(thread.id.clone());
        Ok(thread.id)
    }

    async fn run_tool_calls(
        &self,
        calls: &[RequiredToolCall],
    ) -> Result<(Vec<FunctionCall>, Vec<FunctionExecutionResult>), AgentError> {
        let mut requested = Vec::new();
        let mut results = Vec::new();
        for call in calls {
            let Some(function) = call.function.as_ref() else {
                continue;
            };
            requested.push(FunctionCall {
                id: call.id.clone(),
                name: function.name.clone(),
                arguments: function.arguments.clone(),
            });
            let tool = self
                .function_tools
                .get(&function.name)
                .ok_or_else(|| AgentError::ToolNotFound(function.name.clone()))?;
            let args: Value = if function.arguments.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&function.arguments)
                    .map_err(|e| ToolError::ParamsNotMatched(format!("{}: {e}", function.name)))?
            };
            // A failing tool is reported back to the model, not to the caller.
            let (content, is_error) = match tool.run(args).await {
                Ok(output) => (output, false),
                Err(e) => (e.to_string(), true),
            };
            results.push(FunctionExecutionResult {
                call_id: call.id.clone(),
                name: function.name.clone(),
                content,
                is_error,
            });
        }
        Ok((requested, results))
    }

    /// Poll `run` until it finishes, serving function calls on the way.
    async fn drive_run(
        &self,
        thread_id: &str,
        mut run: ApiRun,
        cancellation_token: &CancellationToken,
        inner: &mut Vec<InnerMessage>,
    ) -> Result<ApiRun, AgentError> {
        loop {
            match run.status {
                RunStatus::Completed => return Ok(run),
                RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                    let error = run.last_error.clone();
                    return Err(AgentError::RunFailed {
                        status: run.status.to_string(),
                        code: error.as_ref().and_then(|e| e.code.clone()),
                        message: error
                            .and_then(|e| e.message)
                            .unwrap_or_else(|| format!("run {} ended without a result", run.id)),
                    });
                }
                RunStatus::RequiresAction => {
                    let calls = run.pending_tool_calls();
                    let (requested, results) = self.run_tool_calls(&calls).await?;
                    let outputs: Vec<ToolOutput> = results
                        .iter()
                        .map(|r| ToolOutput {
                            tool_call_id: r.call_id.clone(),
                            output: r.content.clone(),
                        })
                        .collect();
                    inner.push(
                        AgentEvent::ToolCallRequest {
                            source: self.config.name.clone(),
                            calls: requested,
                            models_usage: None,
                        }
                        .into(),
                    );
                    inner.push(
                        AgentEvent::ToolCallExecution {
                            source: self.config.name.clone(),
                            results,
                        }
                        .into(),
                    );
                    run = cancellable(
                        cancellation_token,
                        self.project.post(
                            &["threads", thread_id, "runs", &run.id, "submit_tool_outputs"],
                            &json!({ "tool_outputs": outputs }),
                        ),
                    )
                    .await?;
                }
                RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown => {
                    if let CancelAware::Cancelled =
                        await_or_cancel(cancellation_token, tokio::time::sleep(self.poll_interval)).await
                    {
                        return Err(AgentError::Cancelled);
                    }
                    run = cancellable(
                        cancellation_token,
                        self.project.get(&["threads", thread_id, "runs", &run.id], &[]),
                    )
                    .await?;
                }
            }
        }
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) {
        let cancelled: Result<ApiRun, AzureError> = self
            .project
            .post(&["threads", thread_id, "runs", run_id, "cancel"], &json!({}))
            .await;
        if let Err(e) = cancelled {
            tracing::warn!(run = run_id, error = %e, "failed to cancel run");
        }
    }

    /// Delete the remote agent and thread, if they were created.
    pub async fn delete(&self) -> Result<(), AgentError> {
        if let Some(thread_id) = self.thread_id.lock().await.take() {
            self.project.delete(&["threads", &thread_id]).await?;
        }
        if let Some(agent_id) = self.agent_id.get() {
            self.project.delete(&["assistants", agent_id]).await?;
            tracing::info!(id = %agent_id, "deleted remote agent");
        }
        Ok(())
    }
}

/// Await an SDK call unless the token fires first.
async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, AgentError>
where
    F: Future<Output = Result<T, AzureError>>,
{
    match await_or_cancel(token, fut).await {
        CancelAware::Value(result) => result.map_err(AgentError::from),
        CancelAware::Cancelled => Err(AgentError::Cancelled),
    }
}

#[async_trait::async_trait]
impl ChatAgent for AzureAiAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    async fn on_messages(
        &self,
        messages: &[TextMessage],
        cancellation_token: &CancellationToken,
    ) -> AgentExecuteResult {
        self.on_messages_with_limit(messages, cancellation_token, DEFAULT_MESSAGE_LIMIT)
            .await
    }

    async fn on_messages_with_limit(
        &self,
        messages: &[TextMessage],
        cancellation_token: &CancellationToken,
        message_limit: usize,
    ) -> AgentExecuteResult {
        let agent_id = cancellable(cancellation_token, self.ensure_agent()).await?;
        let thread_id = cancellable(cancellation_token, self.ensure_thread()).await?;

        for message in messages {
            let _: Value = cancellable(
                cancellation_token,
                self.project.post(
                    &["threads", &thread_id, "messages"],
                    &json!({ "role": "user", "content": message.content }),
                ),
            )
            .await?;
        }

        let run: ApiRun = cancellable(
            cancellation_token,
            self.project.post(&["threads", &thread_id, "runs"], &json!({ "assistant_id": agent_id })),
        )
        .await?;
        tracing::info!(thread = %thread_id, run = %run.id, "run created");

        let run_id = run.id.clone();
        let mut inner = Vec::new();
        let run = match self.drive_run(&thread_id, run, cancellation_token, &mut inner).await {
            Ok(run) => run,
            // A run that reached a terminal status has nothing left to cancel.
            Err(e @ AgentError::RunFailed { .. }) => return Err(e),
            Err(e) => {
                self.cancel_run(&thread_id, &run_id).await;
                return Err(e);
            }
        };
        tracing::info!(run = %run.id, "run completed");

        let listed: ApiMessageList = cancellable(
            cancellation_token,
            self.project.get(
                &["threads", &thread_id, "messages"],
                &[("order", "desc".to_string()), ("limit", message_limit.to_string())],
            ),
        )
        .await?;

        // Newest first on the wire; the conversation reads oldest first.
        let mut replies: Vec<TextMessage> = listed
            .data
            .iter()
            .rev()
            .filter(|m| m.role == "assistant")
            .map(|m| {
                let (text, citations) = m.text_and_citations();
                TextMessage::new(&self.config.name, text)
                    .with_citations(citations)
                    .with_metadata("message_id", &m.id)
            })
            .collect();

        let Some(mut chat_message) = replies.pop() else {
            return Err(AgentError::NoResponse(format!(
                "run {} on thread {} produced no assistant message",
                run.id, thread_id
            )));
        };
        if let Some(usage) = run.usage {
            chat_message = chat_message.with_usage(usage.into());
        }
        inner.extend(replies.into_iter().map(InnerMessage::Chat));
        Ok(Response::new(chat_message).with_inner_messages(inner))
    }

    async fn on_reset(&self, cancellation_token: &CancellationToken) -> Result<(), AgentError> {
        let previous = self.thread_id.lock().await.take();
        if let Some(thread_id) = previous {
            cancellable(cancellation_token, self.project.delete(&["threads", &thread_id])).await?;
            tracing::debug!(thread = %thread_id, "thread discarded");
        }
        Ok(())
    }
}
