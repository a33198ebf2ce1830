use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};

use super::input::UserInputManager;
use super::style::{Color, Style};
use crate::agent::error::AgentError;
use crate::agent::types::{Response, StreamItem, TaskResult};
use crate::message::{AgentEvent, RequestUsage};

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Console output failed: {0}")]
    Io(#[from] io::Error),
    #[error("No TaskResult or Response was processed.")]
    NothingProcessed,
}

/// The last `Response` or `TaskResult` a console run saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    Response(Response),
    TaskResult(TaskResult),
}

impl Processed {
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Processed::Response(r) => Some(r),
            Processed::TaskResult(_) => None,
        }
    }

    pub fn as_task_result(&self) -> Option<&TaskResult> {
        match self {
            Processed::TaskResult(t) => Some(t),
            Processed::Response(_) => None,
        }
    }
}

/// Renders an agent stream as boxed panels.
///
/// Consumes the output of [`crate::agent::run_stream`] or
/// [`crate::agent::on_messages_stream`] and returns the last `Response` or
/// `TaskResult` it saw. With `output_stats` set, token usage is shown next
/// to each message and a summary panel follows every result.
pub struct Console<W = io::Stdout> {
    out: W,
    style: Style,
    output_stats: bool,
    user_input_manager: Option<Arc<UserInputManager>>,
    total_usage: RequestUsage,
}

impl Console<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for Console<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Console<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            style: Style::new(),
            output_stats: false,
            user_input_manager: None,
            total_usage: RequestUsage::default(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_output_stats(mut self, output_stats: bool) -> Self {
        self.output_stats = output_stats;
        self
    }

    pub fn with_user_input_manager(mut self, manager: Arc<UserInputManager>) -> Self {
        self.user_input_manager = Some(manager);
        self
    }

    /// Usage summed over the messages of the last run.
    pub fn total_usage(&self) -> RequestUsage {
        self.total_usage
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    pub async fn run<S>(&mut self, stream: S) -> Result<Processed, ConsoleError>
    where
        S: Stream<Item = Result<StreamItem, AgentError>>,
    {
        futures::pin_mut!(stream);
        let start = Instant::now();
        self.total_usage = RequestUsage::default();

        let mut last_processed = None;
        let mut streaming = false;
        let mut header_printed = false;

        while let Some(item) = stream.next().await {
            let item = item?;
            let is_chunk = matches!(item, StreamItem::Event(AgentEvent::StreamingChunk { .. }));
            if streaming && !is_chunk {
                writeln!(self.out)?;
                streaming = false;
                header_printed = false;
            }

            match item {
                StreamItem::TaskResult(result) => {
                    if self.output_stats {
                        let summary = format!(
                            "Number of messages: {}\nFinish reason: {}\nTotal prompt tokens: {}\nTotal completion tokens: {}\nDuration: {:.2} seconds",
                            result.messages.len(),
                            result.stop_reason.as_deref().unwrap_or("None"),
                            self.total_usage.prompt_tokens,
                            self.total_usage.completion_tokens,
                            start.elapsed().as_secs_f64(),
                        );
                        self.panel("📊 Task Summary", &summary, Color::Green)?;
                    }
                    last_processed = Some(Processed::TaskResult(result));
                }
                StreamItem::Response(response) => {
                    let message = &response.chat_message;
                    let body = self.with_usage(message.to_text(), message.models_usage.as_ref());
                    self.panel(&format!("💬 {}", message.source), &body, Color::Blue)?;
                    if self.output_stats {
                        let summary = format!(
                            "Number of inner messages: {}\nTotal prompt tokens: {}\nTotal completion tokens: {}\nDuration: {:.2} seconds",
                            response.inner_messages.len(),
                            self.total_usage.prompt_tokens,
                            self.total_usage.completion_tokens,
                            start.elapsed().as_secs_f64(),
                        );
                        self.panel("📊 Response Summary", &summary, Color::Green)?;
                    }
                    last_processed = Some(Processed::Response(response));
                }
                StreamItem::Event(AgentEvent::UserInputRequested { request_id, .. }) => {
                    if let Some(manager) = &self.user_input_manager {
                        manager.notify_event_received(&request_id);
                    }
                }
                StreamItem::Event(event @ AgentEvent::StreamingChunk { .. }) => {
                    if !header_printed {
                        let header = format!("🔄 Streaming from {} ({})", event.source(), event.kind());
                        writeln!(self.out, "{}", self.style.italic_cyan(&header))?;
                        header_printed = true;
                    }
                    write!(self.out, "{}", event.to_text())?;
                    self.out.flush()?;
                    streaming = true;
                }
                StreamItem::Event(event) => {
                    let body = self.with_usage(event.to_text(), event.models_usage());
                    let title = format!("🤖 {} ({})", event.kind(), event.source());
                    self.panel(&title, &body, Color::Cyan)?;
                }
                StreamItem::Message(message) => {
                    let body = self.with_usage(message.to_text(), message.models_usage.as_ref());
                    let title = format!("🤖 TextMessage ({})", message.source);
                    self.panel(&title, &body, Color::Cyan)?;
                }
            }
        }

        if streaming {
            writeln!(self.out)?;
        }
        last_processed.ok_or(ConsoleError::NothingProcessed)
    }

    /// Count `usage` into the run total and, with stats on, show it under
    /// `text`.
    fn with_usage(&mut self, mut text: String, usage: Option<&RequestUsage>) -> String {
        if let Some(usage) = usage {
            if self.output_stats {
                let info = format!(
                    "[Prompt tokens: {}, Completion tokens: {}]",
                    usage.prompt_tokens, usage.completion_tokens
                );
                text.push('\n');
                text.push_str(&self.style.dim(&info));
            }
            self.total_usage.add(usage);
        }
        text
    }

    fn panel(&mut self, title: &str, body: &str, color: Color) -> io::Result<()> {
        let rendered = self.style.panel(title, body, color);
        self.out.write_all(rendered.as_bytes())
    }
}

type BuildConsole = dyn Fn(bool) -> Console<Box<dyn Write + Send>> + Send + Sync;

/// Builds the console used to render agent streams. Installed in the
/// default registry as `("ui", "Console")` so it can be swapped at runtime.
#[derive(Clone)]
pub struct ConsoleFactory {
    build: Arc<BuildConsole>,
}

impl ConsoleFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(bool) -> Console<Box<dyn Write + Send>> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
        }
    }

    /// A console with the given `output_stats` setting.
    pub fn build(&self, output_stats: bool) -> Console<Box<dyn Write + Send>> {
        (self.build)(output_stats)
    }
}

impl Default for ConsoleFactory {
    fn default() -> Self {
        Self::new(|output_stats| {
            Console::with_writer(Box::new(io::stdout()) as Box<dyn Write + Send>)
                .with_output_stats(output_stats)
        })
    }
}

impl fmt::Debug for ConsoleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleFactory").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{InnerMessage, TextMessage};
    use futures::stream;

    fn console() -> Console<Vec<u8>> {
        Console::with_writer(Vec::new()).with_style(Style::disabled())
    }

    fn output(console: &Console<Vec<u8>>) -> String {
        String::from_utf8(console.writer().clone()).unwrap()
    }

    fn chunk(content: &str) -> Result<StreamItem, AgentError> {
        Ok(StreamItem::Event(AgentEvent::StreamingChunk {
            source: "assistant".to_string(),
            content: content.to_string(),
        }))
    }

    #[tokio::test]
    async fn returns_last_processed_result() {
        let reply = TextMessage::new("assistant", "Hello!");
        let items = vec![
            Ok(StreamItem::Message(TextMessage::user("Say hello!"))),
            Ok(StreamItem::Response(Response::new(reply.clone()))),
            Ok(StreamItem::TaskResult(TaskResult {
                messages: vec![InnerMessage::Chat(reply)],
                stop_reason: Some("done".to_string()),
            })),
        ];
        let mut console = console();
        let last = console.run(stream::iter(items)).await.unwrap();
        assert_eq!(last.as_task_result().unwrap().stop_reason.as_deref(), Some("done"));

        let out = output(&console);
        assert!(out.contains("🤖 TextMessage (user)"));
        assert!(out.contains("💬 assistant"));
        assert!(out.contains("Hello!"));
        assert!(!out.contains("Task Summary"));
    }

    #[tokio::test]
    async fn empty_stream_is_an_error() {
        let err = console().run(stream::iter(Vec::new())).await.unwrap_err();
        assert!(matches!(err, ConsoleError::NothingProcessed));
        assert_eq!(err.to_string(), "No TaskResult or Response was processed.");
    }

    #[tokio::test]
    async fn events_alone_are_not_a_result() {
        let err = console()
            .run(stream::iter(vec![chunk("partial")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::NothingProcessed));
    }

    #[tokio::test]
    async fn chunks_share_one_header_and_end_with_newline() {
        let items = vec![
            chunk("Hel"),
            chunk("lo"),
            Ok(StreamItem::Response(Response::new(TextMessage::new("assistant", "Hello")))),
        ];
        let mut console = console();
        console.run(stream::iter(items)).await.unwrap();
        let out = output(&console);
        assert_eq!(out.matches("🔄 Streaming from assistant").count(), 1);
        assert!(out.contains("(ModelClientStreamingChunkEvent)\nHello\n╭"));
    }

    #[tokio::test]
    async fn trailing_chunks_get_a_newline() {
        let items = vec![
            Ok(StreamItem::Response(Response::new(TextMessage::new("a", "x")))),
            chunk("tail"),
        ];
        let mut console = console();
        console.run(stream::iter(items)).await.unwrap();
        assert!(output(&console).ends_with("tail\n"));
    }

    #[tokio::test]
    async fn user_input_request_notifies_manager() {
        let manager = Arc::new(UserInputManager::new());
        let items = vec![
            Ok(StreamItem::Event(AgentEvent::UserInputRequested {
                source: "user_proxy".to_string(),
                request_id: "req-9".to_string(),
            })),
            Ok(StreamItem::Response(Response::new(TextMessage::new("a", "x")))),
        ];
        let mut console = console().with_user_input_manager(manager.clone());
        console.run(stream::iter(items)).await.unwrap();
        assert!(manager.event("req-9").is_set());
        assert!(!output(&console).contains("UserInputRequestedEvent"));
    }

    #[tokio::test]
    async fn usage_is_accumulated_and_reported() {
        let items = vec![
            Ok(StreamItem::Message(
                TextMessage::new("planner", "plan").with_usage(RequestUsage::new(3, 4)),
            )),
            Ok(StreamItem::Response(Response::new(
                TextMessage::new("assistant", "answer").with_usage(RequestUsage::new(10, 20)),
            ))),
        ];
        let mut console = console().with_output_stats(true);
        let last = console.run(stream::iter(items)).await.unwrap();
        assert!(last.as_response().is_some());
        assert_eq!(console.total_usage(), RequestUsage::new(13, 24));

        let out = output(&console);
        assert!(out.contains("[Prompt tokens: 10, Completion tokens: 20]"));
        assert!(out.contains("📊 Response Summary"));
        assert!(out.contains("Total prompt tokens: 13"));
    }

    #[tokio::test]
    async fn stream_errors_propagate() {
        let items = vec![Err(AgentError::NoResponse("empty thread".to_string()))];
        let err = console().run(stream::iter(items)).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Agent(AgentError::NoResponse(_))));
    }

    #[test]
    fn factory_applies_output_stats() {
        let factory = ConsoleFactory::default();
        assert!(factory.build(true).output_stats);
        assert!(!factory.build(false).output_stats);
    }
}
