//! Accumulated key sequence shown on the overlay
//!
//! Symbols are appended as they arrive. A run of the same symbol takes at
//! most `max_same_key` slots; once it overflows, its last slot holds a small
//! "...Nx" marker with the running count instead of another copy.

use tracing::debug;

use crate::config::Config;

/// A committed entry of the sequence
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Key(String),
    Collapsed(u32),
}

/// All keys pressed since the overlay was last cleared
#[derive(Debug, Clone)]
pub struct KeySequence {
    tokens: Vec<Token>,
    /// Marker of the current run, committed to `tokens` when the run ends
    collapsed: Option<u32>,
    last_key: Option<String>,
    pressed_times: u32,
    max_same_key: u32,
    marker_font_size: u32,
}

impl KeySequence {
    /// Create an empty sequence. `max_same_key` below 1 is treated as 1.
    pub fn new(max_same_key: u32, marker_font_size: u32) -> Self {
        Self {
            tokens: Vec::new(),
            collapsed: None,
            last_key: None,
            pressed_times: 0,
            max_same_key: max_same_key.max(1),
            marker_font_size,
        }
    }

    /// Append a symbol
    pub fn accept(&mut self, key: &str) {
        if self.last_key.as_deref() != Some(key) {
            if let Some(count) = self.collapsed.take() {
                self.tokens.push(Token::Collapsed(count));
            }
            self.last_key = Some(key.to_string());
            self.pressed_times = 1;
            self.tokens.push(Token::Key(key.to_string()));
        } else if self.pressed_times < self.max_same_key {
            self.pressed_times += 1;
            self.tokens.push(Token::Key(key.to_string()));
        } else {
            if self.collapsed.is_none() {
                // the marker takes over the run's last slot
                self.tokens.pop();
            }
            self.pressed_times += 1;
            self.collapsed = Some(self.pressed_times);
        }

        debug!(
            sequence = %self.render(),
            last_key = key,
            pressed = self.pressed_times,
            "key accepted"
        );
    }

    /// Concatenate all tokens
    pub fn render(&self) -> String {
        self.render_with(|text, out| out.push_str(text))
    }

    /// Like `render`, with key text escaped for rich-text display
    pub fn render_markup(&self) -> String {
        self.render_with(escape_markup)
    }

    /// Marker summarizing `count` repeats of one symbol
    pub fn collapsed_marker(&self, count: u32) -> String {
        format!(
            r#"<span style="font-size: {}px;">...{}x</span>"#,
            self.marker_font_size, count
        )
    }

    /// Reset to the initial empty state
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.collapsed = None;
        self.last_key = None;
        self.pressed_times = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.collapsed.is_none()
    }

    fn render_with(&self, push_key: impl Fn(&str, &mut String)) -> String {
        let mut out = String::new();
        let pending = self.collapsed.map(Token::Collapsed);

        for token in self.tokens.iter().chain(pending.as_ref()) {
            match token {
                Token::Key(text) => push_key(text, &mut out),
                Token::Collapsed(count) => out.push_str(&self.collapsed_marker(*count)),
            }
        }

        out
    }
}

impl Default for KeySequence {
    fn default() -> Self {
        let config = Config::default();
        Self::new(config.max_same_key, config.marker_font_size())
    }
}

fn escape_markup(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}
