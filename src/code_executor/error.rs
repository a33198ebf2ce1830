
#[derive(Debug, thiserror::Error)]
pub enum CodeExecutorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Code execution was cancelled")]
    Cancelled,
}
