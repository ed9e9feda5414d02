use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use wayfarer::context::{ClientContext, ContextStore};
use wayfarer::error::ClientError;
use wayfarer::events::{EndData, StreamEvent};
use wayfarer::models::ChatRequest;
use wayfarer::session::{SessionState, StreamHandler, StreamSession};
use wayfarer::AssistantClient;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "usage: wayfarer [--new] [--list] [--version] <question...>

  --new       start a new conversation instead of continuing the last one
  --list      show stored conversations and exit
  --version   print version and exit

environment:
  WAYFARER_BASE_URL   backend address (default http://127.0.0.1:8000)
  RUST_LOG            log filter, written to stderr";

/// Prints the streamed answer to stdout as it grows.
///
/// Chunks carry the *cumulative* text, so rendering means replacing what is
/// shown, not appending. On a terminal we only ever extend, so when the new
/// text still starts with what was printed we emit just the suffix;
/// otherwise we break the line and print the new text whole.
#[derive(Debug, Default)]
struct ConsolePrinter {
    shown: String,
    thread_id: Option<String>,
    failed: bool,
}

impl ConsolePrinter {
    fn render(&mut self, response: String) {
        use std::io::Write;

        if let Some(suffix) = response.strip_prefix(self.shown.as_str()) {
            print!("{suffix}");
        } else {
            println!();
            print!("{response}");
        }
        let _ = std::io::stdout().flush();
        self.shown = response;
    }
}

impl StreamHandler for ConsolePrinter {
    fn on_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Chunk { response } => self.render(response),
            StreamEvent::Node { node, data } => {
                tracing::debug!(%node, %data, "workflow progress");
            }
            StreamEvent::Error { message, .. } => {
                eprintln!("backend: {message}");
            }
            StreamEvent::Other {
                event_type,
                payload,
            } => {
                tracing::debug!(%event_type, %payload, "unrecognized event");
            }
            StreamEvent::End { .. } => {}
        }
    }

    fn on_complete(&mut self, end: Option<EndData>) {
        if let Some(end) = end {
            // Prefer the terminal frame's full response if it extends what
            // streamed in.
            if let Some(response) = end.response {
                self.render(response);
            }
            self.thread_id = end.thread_id;
        }
        println!();
    }

    fn on_error(&mut self, error: ClientError) {
        eprintln!("error: {error}");
        self.failed = true;
    }
}

async fn list_conversations(client: &AssistantClient, context: &ClientContext) -> Result<()> {
    let conversations = client.conversation_list(context.user_id).await?;
    if conversations.is_empty() {
        println!("no stored conversations");
        return Ok(());
    }
    for conversation in conversations {
        let marker = if context.thread_id.as_deref() == Some(conversation.thread_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}  {}",
            conversation.thread_id,
            conversation.title.as_deref().unwrap_or("(untitled)")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut new_thread = false;
    let mut list = false;
    let mut words: Vec<String> = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--new" => new_thread = true,
            "--list" => list = true,
            "--version" | "-V" => {
                println!("wayfarer {VERSION}");
                return Ok(());
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            other => words.push(other.to_string()),
        }
    }

    let store = ContextStore::new();
    let mut context = match &store {
        Some(store) => store.load(),
        None => ClientContext::generate(),
    };
    if new_thread {
        context.clear_thread();
    }

    let client = AssistantClient::from_env();

    if list {
        return list_conversations(&client, &context).await;
    }

    let question = words.join(" ");
    if question.trim().is_empty() {
        println!("{USAGE}");
        return Ok(());
    }

    let request = ChatRequest::new(context.user_id, question, context.thread_id.clone());
    let mut printer = ConsolePrinter::default();
    let mut session = StreamSession::new();
    let state = session.run(&client, &request, &mut printer).await;

    if let Some(thread_id) = printer.thread_id.take() {
        context.thread_id = Some(thread_id);
    }
    if let Some(store) = &store {
        if let Err(e) = store.save(&context) {
            tracing::warn!(error = %e, "could not persist client context");
        }
    }

    if state == SessionState::Failed || printer.failed {
        return Err(eyre!("chat session failed"));
    }
    Ok(())
}
