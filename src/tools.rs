pub mod traits;
pub mod schema;
pub mod error;
pub mod definition;

pub use definition::{BingGroundingTool, ToolDefinition};
pub use error::ToolError;
pub use traits::Tool;
