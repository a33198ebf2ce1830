//! Run a fenced Python block through the code-executor agent.

use std::sync::Arc;

use agentchat_ext::agent::{CodeExecutorAgent, run_stream};
use agentchat_ext::cancellation::CancellationToken;
use agentchat_ext::code_executor::LocalCommandLineCodeExecutor;
use agentchat_ext::patch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentchat_ext=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let executor = LocalCommandLineCodeExecutor::new()?;
    let agent = CodeExecutorAgent::new("code_executor", Arc::new(executor));

    let task = "```python\nimport sys\nprint(f'Hello from Python {sys.version_info.major}')\n```";
    let token = CancellationToken::new();

    let mut console = patch::console_factory().build(true);
    console.run(run_stream(&agent, task, &token)).await?;
    Ok(())
}
