//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::DisplayEvent;

/// Largest accepted frame body
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Requests from the overlay window to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to display notifications
    Subscribe,

    /// Clear the key sequence and hide the overlay
    Clear,
}

/// Responses from daemon to the overlay window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Clear request accepted
    Cleared,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Display update
    Display { event: DisplayEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Whether the overlay is currently shown
    pub visible: bool,

    /// Text currently shown, empty when hidden
    pub text: String,

    /// Whether the keyboard hook is installed
    pub listener_running: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            visible: false,
            text: String::new(),
            listener_running: false,
            uptime_secs: 0,
        }
    }
}

impl DaemonStatus {
    /// Fold a display event into the snapshot
    pub fn apply(&mut self, event: &DisplayEvent) {
        match event {
            DisplayEvent::Show { text } => {
                self.visible = true;
                self.text = text.clone();
            }
            DisplayEvent::Hide => {
                self.visible = false;
                self.text.clear();
            }
        }
    }
}
