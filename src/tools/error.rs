
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool parameters do not match: {0}")]
    ParamsNotMatched(String),

    #[error("Invalid tool definition: {0}")]
    InvalidDefinition(String),
}
