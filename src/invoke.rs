//! One request/response exchange against a configured agent.
//!
//! [`ask_with_web_search`] is the whole acquire-configure-call-release
//! sequence for a Bing-grounded Azure AI agent. [`ask`] is the last step of
//! it and works with any [`ChatAgent`].

use std::sync::Arc;

use crate::agent::error::AgentError;
use crate::agent::traits::ChatAgent;
use crate::agent::types::Response;
use crate::azure::{AzureAiAgent, ProjectClient, TokenCredential};
use crate::cancellation::CancellationToken;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::message::TextMessage;
use crate::scope::scoped;
use crate::tools::BingGroundingTool;

/// Send `task` to `agent` as a single user message.
///
/// The token and the limit are handed to the agent as given; the agent's
/// response is returned untouched.
pub async fn ask(
    agent: &dyn ChatAgent,
    task: &str,
    cancellation_token: &CancellationToken,
    message_limit: usize,
) -> std::result::Result<Response, AgentError> {
    tracing::info!(agent = agent.name(), message_limit, "sending task");
    let message = TextMessage::user(task);
    agent
        .on_messages_with_limit(std::slice::from_ref(&message), cancellation_token, message_limit)
        .await
}

/// Ask a web-search grounded agent one question.
///
/// The credential and the project client are closed before this returns,
/// whatever the outcome. A connection that cannot be resolved ends the
/// call before any agent is created.
pub async fn ask_with_web_search(
    credential: Arc<dyn TokenCredential>,
    settings: &Settings,
    task: &str,
    cancellation_token: &CancellationToken,
    message_limit: usize,
) -> Result<Response> {
    settings.validate()?;

    scoped(credential, |credential| async move {
        tracing::debug!("credential acquired");
        let project = ProjectClient::new(&settings.project_endpoint, credential)?
            .with_api_version(&settings.api_version);
        tracing::debug!(endpoint = project.endpoint(), "project client opened");

        scoped(Arc::new(project), |project| async move {
            let connection = project
                .connections()
                .get(&settings.bing_connection_name)
                .await?;
            tracing::debug!(connection = %connection.name, "grounding connection resolved");

            let bing = BingGroundingTool::new(&connection.id);
            let agent = AzureAiAgent::new(settings.agent_config(bing.definitions()), project);
            Ok::<_, Error>(ask(&agent, task, cancellation_token, message_limit).await?)
        })
        .await
    })
    .await
}
