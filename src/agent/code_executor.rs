use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::error::AgentError;
use super::traits::ChatAgent;
use super::types::{AgentExecuteResult, Response};
use crate::cancellation::CancellationToken;
use crate::code_executor::{CodeBlock, CodeExecutor};
use crate::message::TextMessage;

pub const DEFAULT_DESCRIPTION: &str = "A computer terminal that performs no other action than running Python scripts (provided to it quoted in ```python code blocks), or sh shell scripts (provided to it quoted in ```sh code blocks).";

const NO_CODE_BLOCKS: &str = "No code blocks found in the thread. Please provide at least one markdown-encoded code block to execute (i.e., quoting code in ```python or ```sh code blocks).";

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:\s*([\w\+\-]+))?\n([\s\S]*?)```").expect("code block pattern is valid")
});

/// Extract fenced markdown code blocks from `markdown`.
pub fn extract_markdown_code_blocks(markdown: &str) -> Vec<CodeBlock> {
    CODE_BLOCK_RE
        .captures_iter(markdown)
        .map(|caps| CodeBlock {
            language: caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            code: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Agent that runs the code blocks found in the messages it receives and
/// replies with their output.
pub struct CodeExecutorAgent {
    name: String,
    description: String,
    code_executor: Arc<dyn CodeExecutor>,
    /// Only messages from these sources are scanned; `None` scans all.
    sources: Option<Vec<String>>,
}

impl CodeExecutorAgent {
    pub fn new(name: impl Into<String>, code_executor: Arc<dyn CodeExecutor>) -> Self {
        Self {
            name: name.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            code_executor,
            sources: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    fn accepts(&self, message: &TextMessage) -> bool {
        match &self.sources {
            None => true,
            Some(sources) => sources.iter().any(|s| *s == message.source),
        }
    }

    fn reply(&self, content: String) -> Response {
        Response::new(TextMessage::new(&self.name, content))
    }
}

#[async_trait::async_trait]
impl ChatAgent for CodeExecutorAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn on_messages(
        &self,
        messages: &[TextMessage],
        cancellation_token: &CancellationToken,
    ) -> AgentExecuteResult {
        let code_blocks: Vec<CodeBlock> = messages
            .iter()
            .filter(|m| self.accepts(m))
            .flat_map(|m| extract_markdown_code_blocks(&m.content))
            .collect();

        if code_blocks.is_empty() {
            return Ok(self.reply(NO_CODE_BLOCKS.to_string()));
        }

        tracing::debug!(agent = %self.name, blocks = code_blocks.len(), "executing code blocks");
        let result = self
            .code_executor
            .execute_code_blocks(&code_blocks, cancellation_token)
            .await?;

        let content = if result.output.trim().is_empty() {
            format!(
                "The script ran but produced no output to console. The POSIX exit code was: {}. If you were expecting output, consider revising the script to ensure content is printed to stdout.",
                result.exit_code
            )
        } else if result.exit_code != 0 {
            format!(
                "The script ran, then exited with an error (POSIX exit code: {})\nIts output was:\n{}",
                result.exit_code, result.output
            )
        } else {
            result.output
        };
        Ok(self.reply(content))
    }

    async fn on_reset(&self, _cancellation_token: &CancellationToken) -> Result<(), AgentError> {
        // No conversation state to forget.
        Ok(())
    }
}
