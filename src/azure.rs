//! Client side of the Azure AI Foundry agent service.
//!
//! Only the REST contract is implemented here: the remote service runs the
//! model, the grounding tools and the citation logic.

use std::time::Duration;

use reqwest::Client;

pub mod error;
pub mod credential;
pub mod project;
pub mod types;
pub mod agent;

pub use agent::{AgentConfig, AzureAiAgent};
pub use credential::{
    AccessToken, ClientSecretCredential, DefaultAzureCredential, StaticTokenCredential,
    TokenCredential,
};
pub use error::AzureError;
pub use project::{Connection, ProjectClient};

/// Build an HTTP client with appropriate timeouts and connection limits.
pub(crate) fn build_http_client() -> Result<Client, AzureError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(2)
        .build()?;
    Ok(client)
}

/// Turn a non-success response into `AzureError::Api`, keeping the
/// service's error code and message.
pub(crate) async fn api_error(response: reqwest::Response) -> AzureError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<types::ApiErrorBody>(&body).ok();
    match parsed.and_then(|b| b.error) {
        Some(detail) => AzureError::Api {
            status,
            code: detail.code,
            message: detail.message.unwrap_or(body),
        },
        None => AzureError::Api {
            status,
            code: None,
            message: body,
        },
    }
}
