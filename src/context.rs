//! Per-client identity and sticky conversation state.
//!
//! The browser revisions of this client scattered the user id and current
//! thread id across ad-hoc local-storage keys. Here both live in one
//! explicit value object, created at bootstrap and passed into request
//! construction; persistence is a JSON file under the platform config dir.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stable client identity plus the thread the next request continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientContext {
    pub user_id: i64,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ClientContext {
    /// Fresh context with a randomly generated user id and no thread.
    pub fn generate() -> Self {
        // The backend expects a plain integer id; fold a v4 UUID down to
        // six digits like the original client did with its random ids.
        let user_id = (Uuid::new_v4().as_u128() % 1_000_000) as i64;
        Self {
            user_id,
            thread_id: None,
        }
    }

    /// Forget the sticky thread so the next request starts a new
    /// conversation.
    pub fn clear_thread(&mut self) {
        self.thread_id = None;
    }
}

/// Loads and saves a [`ClientContext`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    /// Store under the platform config dir (`~/.config/wayfarer/context.json`
    /// on Linux). `None` when no config dir can be determined.
    pub fn new() -> Option<Self> {
        let dir = dirs::config_dir()?.join("wayfarer");
        Some(Self {
            path: dir.join("context.json"),
        })
    }

    /// Store at an explicit path. Used by tests.
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the saved context, or generate a fresh one if the file is
    /// missing or unreadable.
    pub fn load(&self) -> ClientContext {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(context) => context,
                Err(e) => {
                    tracing::warn!(error = %e, path = %self.path.display(),
                        "context file unreadable, generating a new identity");
                    ClientContext::generate()
                }
            },
            Err(_) => ClientContext::generate(),
        }
    }

    pub fn save(&self, context: &ClientContext) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(context)?;
        std::fs::write(&self.path, raw)
    }
}
