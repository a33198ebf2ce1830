use crate::agent::error::AgentError;
use crate::azure::error::AzureError;
use crate::code_executor::CodeExecutorError;
use crate::config::ConfigError;
use crate::patch::PatchError;
use crate::tools::error::ToolError;
use crate::ui::console::ConsoleError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Azure(#[from] AzureError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Code executor error: {0}")]
    CodeExecutor(#[from] CodeExecutorError),

    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),
}

pub type Result<T> = std::result::Result<T, Error>;
