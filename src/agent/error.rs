use crate::azure::error::AzureError;
use crate::code_executor::CodeExecutorError;
use crate::tools::error::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution error: {0}")]
    ToolExecutionError(#[from] ToolError),

    #[error("Code execution error: {0}")]
    CodeExecutionError(#[from] CodeExecutorError),

    #[error(transparent)]
    Azure(#[from] AzureError),

    #[error("Run {status}: {message}")]
    RunFailed {
        status: String,
        code: Option<String>,
        message: String,
    },

    #[error("No response from agent: {0}")]
    NoResponse(String),

    #[error("Operation was cancelled")]
    Cancelled,
}
