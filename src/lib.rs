//! Wayfarer - a terminal client for a streaming travel-assistant backend
//!
//! The core is the streaming pipeline: [`client::AssistantClient`] opens
//! the chat endpoint, [`decoder::FrameDecoder`] reassembles newline-delimited
//! frames from arbitrary byte chunks, [`events::StreamEvent`] is the typed
//! event model, and [`session::StreamSession`] drives the loop with
//! exactly-once terminal delivery into a [`session::StreamHandler`].

pub mod client;
pub mod context;
pub mod decoder;
pub mod error;
pub mod events;
pub mod models;
pub mod session;

pub use client::{AssistantClient, EventStream};
pub use error::ClientError;
pub use events::StreamEvent;
pub use session::{SessionState, StreamHandler, StreamSession};
