//! Events sent from the presenter to the display
//!
//! The overlay window itself lives outside this crate; it only needs to
//! know what text to show and when to hide.

use serde::{Deserialize, Serialize};

/// Display updates emitted by the presenter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// Show the overlay with this (rich) text
    Show {
        /// Rendered key sequence
        text: String,
    },

    /// Hide the overlay; the sequence has been cleared
    Hide,
}

impl std::fmt::Display for DisplayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayEvent::Show { text } => write!(f, "SHOW ({} bytes)", text.len()),
            DisplayEvent::Hide => write!(f, "HIDE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DisplayEvent::Show {
            text: "Ctrl+c".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"show","text":"Ctrl+c"}"#);
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"hide"}"#;
        let event: DisplayEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, DisplayEvent::Hide);
    }
}
