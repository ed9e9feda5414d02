//! Stream session controller.
//!
//! Drives one chat stream from request to terminal state and routes every
//! decoded event to a caller-supplied [`StreamHandler`]. The controller
//! never returns an error itself: all failures arrive through
//! [`StreamHandler::on_error`], and exactly one terminal callback
//! (`on_complete` or `on_error`) fires per session, no matter how the
//! stream ends.

use futures_util::{Stream, StreamExt};

use crate::client::AssistantClient;
use crate::error::ClientError;
use crate::events::{EndData, StreamEvent};
use crate::models::ChatRequest;

/// Lifecycle of one streaming call.
///
/// `Completed` and `Failed` are terminal; a session is single-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Requesting,
    Streaming,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

/// Consumer seat for one stream session (the conversation adapter).
///
/// `on_event` receives chunks, node markers, backend `error` frames and
/// unknown event types alike; backend `error` frames are informational and
/// do not end the session. `on_complete` carries the terminal frame's data
/// when the server sent one, `None` when the stream simply closed.
pub trait StreamHandler {
    fn on_event(&mut self, event: StreamEvent);
    fn on_complete(&mut self, end: Option<EndData>);
    fn on_error(&mut self, error: ClientError);
}

/// One streaming call: request, decode loop, terminal delivery.
#[derive(Debug)]
pub struct StreamSession {
    state: SessionState,
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Issue the request and pump events into the handler until the
    /// session reaches a terminal state.
    ///
    /// A transport failure goes straight to `Failed` without ever entering
    /// `Streaming`. Progress already delivered through `on_event` is never
    /// rolled back.
    pub async fn run<H: StreamHandler>(
        &mut self,
        client: &AssistantClient,
        request: &ChatRequest,
        handler: &mut H,
    ) -> SessionState {
        debug_assert_eq!(self.state, SessionState::Idle, "sessions are single-use");
        self.state = SessionState::Requesting;

        let events = match client.chat_stream(request).await {
            Ok(events) => events,
            Err(e) => {
                self.state = SessionState::Failed;
                handler.on_error(e);
                return self.state;
            }
        };

        self.drive(events, handler).await
    }

    /// Pump an already-open event stream into the handler.
    ///
    /// Split out from [`run`](Self::run) so the state machine can be
    /// exercised against synthetic streams.
    pub async fn drive<S, H>(&mut self, mut events: S, handler: &mut H) -> SessionState
    where
        S: Stream<Item = Result<StreamEvent, ClientError>> + Unpin,
        H: StreamHandler,
    {
        self.state = SessionState::Streaming;

        // First terminal wins: the loop stops reading at the first `end`
        // frame or read failure, so later terminal-looking items are never
        // delivered twice.
        while let Some(item) = events.next().await {
            match item {
                Ok(StreamEvent::End { data }) => {
                    tracing::debug!(thread_id = ?data.thread_id, "stream completed");
                    self.state = SessionState::Completed;
                    handler.on_complete(Some(data));
                    break;
                }
                Ok(event) => handler.on_event(event),
                Err(e) => {
                    tracing::debug!(error = %e, "stream failed mid-read");
                    self.state = SessionState::Failed;
                    handler.on_error(e);
                    break;
                }
            }
        }

        // The transport closed without a terminal frame; finalize anyway
        // rather than waiting for one that will never arrive.
        if !self.state.is_terminal() {
            self.state = SessionState::Completed;
            handler.on_complete(None);
        }

        self.state
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}
