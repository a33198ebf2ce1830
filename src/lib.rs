//! Extensions for a multi-agent chat runtime: a web-search grounded Azure AI
//! agent and the glue to ask it a question, a code-executor agent, a
//! console renderer for agent streams, and a registry for swapping
//! components at runtime.

// Lets `#[tool]` expansions name this crate the same way inside and outside it.
extern crate self as agentchat_ext;

pub mod agent;
pub mod azure;
pub mod cancellation;
pub mod code_executor;
pub mod config;
pub mod error;
pub mod invoke;
pub mod message;
pub mod patch;
pub mod scope;
pub mod tools;
pub mod ui;

pub use agentchat_ext_macros::tool;

// Used by `#[tool]` expansions.
#[doc(hidden)]
pub use async_trait;
#[doc(hidden)]
pub use serde;
#[doc(hidden)]
pub use serde_json;

pub use error::{Error, Result};
pub use invoke::{ask, ask_with_web_search};
