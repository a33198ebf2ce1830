//! Ask a Bing-grounded Azure AI agent one question and render the answer.
//!
//! Needs `PROJECT_ENDPOINT`, `BING_CONNECTION_NAME` and Azure credentials
//! (`AZURE_TENANT_ID`/`AZURE_CLIENT_ID`/`AZURE_CLIENT_SECRET` or
//! `AZURE_ACCESS_TOKEN`) in the environment.

use std::sync::Arc;

use agentchat_ext::agent::error::AgentError;
use agentchat_ext::agent::types::StreamItem;
use agentchat_ext::azure::DefaultAzureCredential;
use agentchat_ext::cancellation::CancellationToken;
use agentchat_ext::config::Settings;
use agentchat_ext::{ask_with_web_search, patch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TASK: &str = "What is Microsoft's annual leave policy? Provide citations for your answers.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentchat_ext=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let credential = Arc::new(DefaultAzureCredential::from_env()?);

    let token = CancellationToken::new();
    let on_ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let response = ask_with_web_search(credential, &settings, TASK, &token, 1).await?;

    let mut items: Vec<Result<StreamItem, AgentError>> = response
        .inner_messages
        .iter()
        .cloned()
        .map(|m| Ok(StreamItem::from(m)))
        .collect();
    items.push(Ok(StreamItem::Response(response)));

    let mut console = patch::console_factory().build(true);
    console.run(futures::stream::iter(items)).await?;
    Ok(())
}
