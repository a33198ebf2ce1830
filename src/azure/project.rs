use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::credential::{AI_SCOPE, TokenCredential};
use super::error::AzureError;
use super::types::ApiConnection;
use super::{api_error, build_http_client};
use crate::config::DEFAULT_API_VERSION;
use crate::scope::AsyncClose;

/// A named resource connection of the project, e.g. a Bing grounding
/// resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Fully qualified resource id, as expected by tool definitions.
    pub id: String,
    pub name: String,
    /// Connection type, e.g. `ApiKey` or `BingLLMSearch`.
    pub kind: String,
    pub target: Option<String>,
    pub is_default: bool,
    pub metadata: Option<Value>,
}

impl From<ApiConnection> for Connection {
    fn from(raw: ApiConnection) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            kind: raw.kind,
            target: raw.target,
            is_default: raw.is_default,
            metadata: raw.metadata,
        }
    }
}

/// Client for one Azure AI Foundry project.
///
/// All requests carry a bearer token from the credential and the
/// configured `api-version`. Once closed, every request fails with
/// [`AzureError::ClientClosed`].
pub struct ProjectClient {
    endpoint: Url,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    http: Client,
    closed: AtomicBool,
}

impl ProjectClient {
    pub fn new(endpoint: &str, credential: Arc<dyn TokenCredential>) -> Result<Self, AzureError> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| AzureError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(AzureError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            endpoint,
            api_version: DEFAULT_API_VERSION.to_string(),
            credential,
            http: build_http_client()?,
            closed: AtomicBool::new(false),
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> Connections<'_> {
        Connections { client: self }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, AzureError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| AzureError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request to `segments` under the project endpoint and decode
    /// the JSON reply.
    pub(crate) async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, AzureError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        if self.is_closed() {
            return Err(AzureError::ClientClosed);
        }
        let token = self.credential.get_token(&[AI_SCOPE]).await?;
        let url = self.url(segments)?;
        tracing::trace!(%method, %url, "project request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&token.token)
            .query(&[("api-version", self.api_version.as_str())])
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, AzureError> {
        self.request::<T, Value>(Method::GET, segments, query, None).await
    }

    pub(crate) async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, AzureError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, segments, &[], Some(body)).await
    }

    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<Value, AzureError> {
        self.request::<Value, Value>(Method::DELETE, segments, &[], None).await
    }
}

#[async_trait::async_trait]
impl AsyncClose for ProjectClient {
    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(endpoint = %self.endpoint, "project client closed");
        }
    }
}

/// Connection lookups of a project.
pub struct Connections<'a> {
    client: &'a ProjectClient,
}

impl Connections<'_> {
    /// Resolve a connection by name. A missing connection surfaces as the
    /// service's 404 `AzureError::Api`.
    pub async fn get(&self, name: &str) -> Result<Connection, AzureError> {
        let raw: ApiConnection = self.client.get(&["connections", name], &[]).await?;
        tracing::debug!(connection = %raw.name, kind = %raw.kind, "resolved connection");
        Ok(raw.into())
    }
}
