//! Bearer-token credentials for the project endpoint.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::build_http_client;
use super::error::AzureError;
use crate::scope::AsyncClose;

/// Token scope of the Azure AI Foundry data plane.
pub const AI_SCOPE: &str = "https://ai.azure.com/.default";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// A bearer token and the moment it stops being valid.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: SystemTime,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_on
            .duration_since(SystemTime::now())
            .is_ok_and(|left| left > REFRESH_MARGIN)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens. `close` releases cached secrets and connections.
#[async_trait::async_trait]
pub trait TokenCredential: AsyncClose {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, AzureError>;
}

/// A fixed token, e.g. one minted by `az account get-access-token`.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait::async_trait]
impl AsyncClose for StaticTokenCredential {
    async fn close(&self) {}
}

#[async_trait::async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, AzureError> {
        Ok(AccessToken {
            token: self.token.clone(),
            // The service decides; we never refresh a static token.
            expires_on: SystemTime::now() + Duration::from_secs(24 * 3600),
        })
    }
}

/// OAuth2 client-credentials flow for a service principal.
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    http: Client,
    cache: Mutex<HashMap<String, AccessToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, AzureError> {
        Ok(Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http: build_http_client()?,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Use a different Entra ID authority (sovereign clouds, tests).
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into().trim_end_matches('/').to_string();
        self
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken, AzureError> {
        let url = format!("{}/{}/oauth2/v2.0/token", self.authority_host, self.tenant_id);
        tracing::debug!(tenant = %self.tenant_id, scope, "requesting access token");
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(e) => match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                },
                Err(_) => body,
            };
            return Err(AzureError::Auth {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(AccessToken {
            token: token.access_token,
            expires_on: SystemTime::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait::async_trait]
impl AsyncClose for ClientSecretCredential {
    async fn close(&self) {
        self.cache.lock().await.clear();
    }
}

#[async_trait::async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, AzureError> {
        let scope = scopes.join(" ");
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(&scope).filter(|t| t.is_fresh()) {
            return Ok(token.clone());
        }
        let token = self.request_token(&scope).await?;
        cache.insert(scope, token.clone());
        Ok(token)
    }
}

/// Credential picked from the environment.
///
/// Tries, in order: a service principal (`AZURE_TENANT_ID`,
/// `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`, optional
/// `AZURE_AUTHORITY_HOST`), then a raw token in `AZURE_ACCESS_TOKEN`.
pub struct DefaultAzureCredential {
    inner: Box<dyn TokenCredential>,
}

impl DefaultAzureCredential {
    pub fn from_env() -> Result<Self, AzureError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AzureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let (Some(tenant), Some(client), Some(secret)) = (
            present("AZURE_TENANT_ID"),
            present("AZURE_CLIENT_ID"),
            present("AZURE_CLIENT_SECRET"),
        ) {
            let mut credential = ClientSecretCredential::new(tenant, client, secret)?;
            if let Some(host) = present("AZURE_AUTHORITY_HOST") {
                credential = credential.with_authority_host(host);
            }
            tracing::debug!("using client secret credential");
            return Ok(Self {
                inner: Box::new(credential),
            });
        }
        if let Some(token) = present("AZURE_ACCESS_TOKEN") {
            tracing::debug!("using static access token");
            return Ok(Self {
                inner: Box::new(StaticTokenCredential::new(token)),
            });
        }
        Err(AzureError::CredentialUnavailable(
            "set AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET, or AZURE_ACCESS_TOKEN"
                .to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl AsyncClose for DefaultAzureCredential {
    async fn close(&self) {
        self.inner.close().await;
    }
}

#[async_trait::async_trait]
impl TokenCredential for DefaultAzureCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, AzureError> {
        self.inner.get_token(scopes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[tokio::test]
    async fn static_token_is_returned() {
        let credential = StaticTokenCredential::new("abc");
        let token = credential.get_token(&[AI_SCOPE]).await.unwrap();
        assert_eq!(token.token, "abc");
        assert!(token.is_fresh());
    }

    #[test]
    fn debug_redacts_token() {
        let token = AccessToken {
            token: "secret".to_string(),
            expires_on: SystemTime::now(),
        };
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[tokio::test]
    async fn client_secret_flow_caches_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                Matcher::UrlEncoded("client_id".into(), "client-1".into()),
                Matcher::UrlEncoded("scope".into(), AI_SCOPE.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"tok-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let credential = ClientSecretCredential::new("tenant-1", "client-1", "s3cret")
            .unwrap()
            .with_authority_host(server.url());
        let first = credential.get_token(&[AI_SCOPE]).await.unwrap();
        let second = credential.get_token(&[AI_SCOPE]).await.unwrap();
        assert_eq!(first.token, "tok-1");
        assert_eq!(second.token, "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn close_drops_cached_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/t/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"expires_in":3599,"access_token":"tok"}"#)
            .expect(2)
            .create_async()
            .await;

        let credential = ClientSecretCredential::new("t", "c", "s")
            .unwrap()
            .with_authority_host(server.url());
        credential.get_token(&[AI_SCOPE]).await.unwrap();
        credential.close().await;
        credential.get_token(&[AI_SCOPE]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn auth_failure_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/t/oauth2/v2.0/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client","error_description":"bad secret"}"#)
            .create_async()
            .await;

        let credential = ClientSecretCredential::new("t", "c", "s")
            .unwrap()
            .with_authority_host(server.url());
        let err = credential.get_token(&[AI_SCOPE]).await.unwrap_err();
        match err {
            AzureError::Auth { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid_client: bad secret");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn default_prefers_static_token_when_no_principal() {
        let credential =
            DefaultAzureCredential::from_lookup(lookup_from(&[("AZURE_ACCESS_TOKEN", "raw")])).unwrap();
        assert_eq!(credential.get_token(&[AI_SCOPE]).await.unwrap().token, "raw");
    }

    #[test]
    fn default_without_anything_is_unavailable() {
        let err = DefaultAzureCredential::from_lookup(lookup_from(&[("AZURE_CLIENT_ID", "c")]))
            .err()
            .expect("no credential should be configured");
        assert!(matches!(err, AzureError::CredentialUnavailable(_)));
    }
}
