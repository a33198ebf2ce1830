//! Execution of fenced code blocks extracted from chat messages.

pub mod error;
pub mod local;

use serde::{Deserialize, Serialize};

use crate::cancellation::CancellationToken;

pub use error::CodeExecutorError;
pub use local::LocalCommandLineCodeExecutor;

/// A block of source code and the language it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub code: String,
    /// Fence info string, e.g. `python` or `sh`. Empty when the fence had none.
    pub language: String,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
        }
    }
}

/// Combined outcome of running a sequence of code blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeResult {
    pub exit_code: i32,
    pub output: String,
}

#[async_trait::async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run `code_blocks` in order, stopping at the first failing block.
    async fn execute_code_blocks(
        &self,
        code_blocks: &[CodeBlock],
        cancellation_token: &CancellationToken,
    ) -> Result<CodeResult, CodeExecutorError>;
}
