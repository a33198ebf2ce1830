use thiserror::Error;

#[derive(Debug, Error)]
pub enum AzureError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({status}{}): {message}", .code.as_deref().map(|c| format!(", {c}")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Client is closed")]
    ClientClosed,
}

impl AzureError {
    /// HTTP status reported by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AzureError::Api { status, .. } | AzureError::Auth { status, .. } => Some(*status),
            AzureError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
