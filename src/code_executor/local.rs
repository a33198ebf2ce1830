use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;

use super::{CodeBlock, CodeExecutor, CodeExecutorError, CodeResult};
use crate::cancellation::{CancelAware, CancellationToken, await_or_cancel};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Exit code reported for a block that ran past the timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Runs code blocks as child processes on the local machine.
///
/// Each block is written to a uniquely named file in the work directory and
/// run with the matching interpreter, so concurrent calls on one executor do
/// not see each other's files. There is no isolation beyond the process
/// boundary.
pub struct LocalCommandLineCodeExecutor {
    work_dir: PathBuf,
    timeout: Duration,
    python: String,
    // Keeps an owned temporary work dir alive for the executor's lifetime.
    _temp_dir: Option<TempDir>,
}

impl LocalCommandLineCodeExecutor {
    /// Executor with a fresh temporary work directory.
    pub fn new() -> Result<Self, CodeExecutorError> {
        let temp_dir = tempfile::tempdir()?;
        Ok(Self {
            work_dir: temp_dir.path().to_path_buf(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            python: "python3".to_string(),
            _temp_dir: Some(temp_dir),
        })
    }

    /// Executor writing its files into `work_dir`, which must exist.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            python: "python3".to_string(),
            _temp_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Interpreter used for `python` blocks.
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn interpreter(&self, language: &str) -> Option<(&str, &'static str)> {
        match language.to_ascii_lowercase().as_str() {
            "python" | "py" | "python3" => Some((self.python.as_str(), "py")),
            "sh" | "shell" => Some(("sh", "sh")),
            "bash" => Some(("bash", "sh")),
            _ => None,
        }
    }

    async fn run_block(
        &self,
        index: usize,
        block: &CodeBlock,
        cancellation_token: &CancellationToken,
    ) -> Result<CodeResult, CodeExecutorError> {
        let Some((program, extension)) = self.interpreter(&block.language) else {
            return Ok(CodeResult {
                exit_code: 1,
                output: format!("unknown language {:?}", block.language),
            });
        };

        // Removed when dropped, after the child has exited.
        let script = tempfile::Builder::new()
            .prefix(&format!("block_{index}_"))
            .suffix(&format!(".{extension}"))
            .tempfile_in(&self.work_dir)?;
        tokio::fs::write(script.path(), &block.code).await?;

        tracing::debug!(language = %block.language, file = %script.path().display(), "running code block");
        let child = Command::new(program)
            .arg(script.path())
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the output future on timeout or cancel kills the child.
        let run = tokio::time::timeout(self.timeout, child.wait_with_output());
        let output = match await_or_cancel(cancellation_token, run).await {
            CancelAware::Cancelled => return Err(CodeExecutorError::Cancelled),
            CancelAware::Value(Err(_)) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "code block timed out");
                return Ok(CodeResult {
                    exit_code: TIMEOUT_EXIT_CODE,
                    output: "\nTimeout".to_string(),
                });
            }
            CancelAware::Value(Ok(output)) => output?,
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CodeResult {
            // Killed by a signal: no exit code, report a generic failure.
            exit_code: output.status.code().unwrap_or(1),
            output: text,
        })
    }
}

#[async_trait::async_trait]
impl CodeExecutor for LocalCommandLineCodeExecutor {
    async fn execute_code_blocks(
        &self,
        code_blocks: &[CodeBlock],
        cancellation_token: &CancellationToken,
    ) -> Result<CodeResult, CodeExecutorError> {
        let mut output = String::new();
        let mut exit_code = 0;
        for (index, block) in code_blocks.iter().enumerate() {
            let result = self.run_block(index, block, cancellation_token).await?;
            output.push_str(&result.output);
            exit_code = result.exit_code;
            if exit_code != 0 {
                break;
            }
        }
        Ok(CodeResult { exit_code, output })
    }
}
