//! Key identifiers and the static symbol tables
//!
//! Named keys form a closed set; each one maps to a display glyph, falling
//! back to its identifier name when the table has no entry for it.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// A raw key delivered by the keyboard hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A key that normally produces a character
    Printable {
        /// Character the OS reported for this press, if any
        ch: Option<char>,
        /// Platform virtual-key code, used when `ch` is missing or unusable
        vk: Option<u32>,
    },
    /// A key from the closed set of non-character keys
    Named(NamedKey),
}

impl Key {
    /// Printable key carrying a character and no virtual-key code
    pub fn char(ch: char) -> Self {
        Key::Printable { ch: Some(ch), vk: None }
    }

    /// Modifier category, if this key is a modifier
    pub fn modifier(&self) -> Option<Modifier> {
        match self {
            Key::Named(named) => named.modifier(),
            Key::Printable { .. } => None,
        }
    }
}

impl From<NamedKey> for Key {
    fn from(named: NamedKey) -> Self {
        Key::Named(named)
    }
}

/// Logical modifier categories, side-insensitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Alt,
    Ctrl,
    Shift,
    Super,
}

/// Non-character keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    AltLeft,
    AltRight,
    AltGr,
    CtrlLeft,
    CtrlRight,
    ShiftLeft,
    ShiftRight,
    SuperLeft,
    SuperRight,

    Backspace,
    Tab,
    Enter,
    Escape,
    Space,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,

    Up,
    Down,
    Left,
    Right,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    CapsLock,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    Menu,

    MediaPlayPause,
    MediaNext,
    MediaPrevious,
    MediaVolumeUp,
    MediaVolumeDown,
    MediaVolumeMute,
}

impl NamedKey {
    /// Modifier category for modifier keys
    pub fn modifier(self) -> Option<Modifier> {
        match self {
            NamedKey::AltLeft | NamedKey::AltRight | NamedKey::AltGr => Some(Modifier::Alt),
            NamedKey::CtrlLeft | NamedKey::CtrlRight => Some(Modifier::Ctrl),
            NamedKey::ShiftLeft | NamedKey::ShiftRight => Some(Modifier::Shift),
            NamedKey::SuperLeft | NamedKey::SuperRight => Some(Modifier::Super),
            _ => None,
        }
    }

    /// Named keys that take modifier prefixes like printable keys do
    pub fn is_combinable(self) -> bool {
        matches!(self, NamedKey::Tab | NamedKey::Space)
    }

    /// Identifier name, shown when the glyph table has no entry
    pub fn name(self) -> &'static str {
        match self {
            NamedKey::AltLeft => "alt_l",
            NamedKey::AltRight => "alt_r",
            NamedKey::AltGr => "alt_gr",
            NamedKey::CtrlLeft => "ctrl_l",
            NamedKey::CtrlRight => "ctrl_r",
            NamedKey::ShiftLeft => "shift",
            NamedKey::ShiftRight => "shift_r",
            NamedKey::SuperLeft => "cmd",
            NamedKey::SuperRight => "cmd_r",
            NamedKey::Backspace => "backspace",
            NamedKey::Tab => "tab",
            NamedKey::Enter => "enter",
            NamedKey::Escape => "esc",
            NamedKey::Space => "space",
            NamedKey::Delete => "delete",
            NamedKey::Insert => "insert",
            NamedKey::Home => "home",
            NamedKey::End => "end",
            NamedKey::PageUp => "page_up",
            NamedKey::PageDown => "page_down",
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
            NamedKey::F1 => "f1",
            NamedKey::F2 => "f2",
            NamedKey::F3 => "f3",
            NamedKey::F4 => "f4",
            NamedKey::F5 => "f5",
            NamedKey::F6 => "f6",
            NamedKey::F7 => "f7",
            NamedKey::F8 => "f8",
            NamedKey::F9 => "f9",
            NamedKey::F10 => "f10",
            NamedKey::F11 => "f11",
            NamedKey::F12 => "f12",
            NamedKey::CapsLock => "caps_lock",
            NamedKey::NumLock => "num_lock",
            NamedKey::ScrollLock => "scroll_lock",
            NamedKey::PrintScreen => "print_screen",
            NamedKey::Pause => "pause",
            NamedKey::Menu => "menu",
            NamedKey::MediaPlayPause => "media_play_pause",
            NamedKey::MediaNext => "media_next",
            NamedKey::MediaPrevious => "media_previous",
            NamedKey::MediaVolumeUp => "media_volume_up",
            NamedKey::MediaVolumeDown => "media_volume_down",
            NamedKey::MediaVolumeMute => "media_volume_mute",
        }
    }

    /// Entry in the special-keys table
    fn glyph(self) -> Option<&'static str> {
        let glyph = match self {
            NamedKey::Backspace => "⌫",
            NamedKey::Tab => "⇥",
            NamedKey::Enter => "⏎",
            NamedKey::Escape => "Esc",
            NamedKey::Space => "␣",
            NamedKey::Delete => "⌦",
            NamedKey::Home => "⇱",
            NamedKey::End => "⇲",
            NamedKey::PageUp => "⇞",
            NamedKey::PageDown => "⇟",
            NamedKey::Up => "↑",
            NamedKey::Down => "↓",
            NamedKey::Left => "←",
            NamedKey::Right => "→",
            NamedKey::F1 => "F1",
            NamedKey::F2 => "F2",
            NamedKey::F3 => "F3",
            NamedKey::F4 => "F4",
            NamedKey::F5 => "F5",
            NamedKey::F6 => "F6",
            NamedKey::F7 => "F7",
            NamedKey::F8 => "F8",
            NamedKey::F9 => "F9",
            NamedKey::F10 => "F10",
            NamedKey::F11 => "F11",
            NamedKey::F12 => "F12",
            NamedKey::CapsLock => "⇪",
            NamedKey::PrintScreen => "PrtSc",
            NamedKey::MediaPlayPause => "⏯",
            NamedKey::MediaNext => "⏭",
            NamedKey::MediaPrevious => "⏮",
            _ => return None,
        };
        Some(glyph)
    }

    /// Display symbol: table glyph, else the identifier name
    pub fn symbol(self) -> &'static str {
        self.glyph().unwrap_or_else(|| self.name())
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Platform family, selects modifier glyphs and virtual-key decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// Platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Prefix shown for a held modifier.
    ///
    /// On macOS Ctrl gets its own ⌃ rather than sharing ⌘ with Command, so
    /// Ctrl+C and ⌘+C stay distinguishable on the overlay.
    pub fn modifier_glyph(self, modifier: Modifier) -> &'static str {
        match (self, modifier) {
            (Platform::MacOs, Modifier::Ctrl) => "⌃+",
            (Platform::MacOs, Modifier::Alt) => "⌥+",
            (Platform::MacOs, Modifier::Shift) => "⇧+",
            (Platform::MacOs, Modifier::Super) => "⌘+",
            (_, Modifier::Ctrl) => "Ctrl+",
            (_, Modifier::Alt) => "Alt+",
            (_, Modifier::Shift) => "Shift+",
            (Platform::Windows, Modifier::Super) => "Win+",
            (_, Modifier::Super) => "Super+",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "mac" => Ok(Platform::MacOs),
            "windows" | "win" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            other => Err(ConfigError::Invalid {
                var: "platform",
                value: other.to_string(),
                reason: "expected macos, windows or linux",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_categories() {
        assert_eq!(NamedKey::AltGr.modifier(), Some(Modifier::Alt));
        assert_eq!(NamedKey::CtrlRight.modifier(), Some(Modifier::Ctrl));
        assert_eq!(NamedKey::ShiftLeft.modifier(), Some(Modifier::Shift));
        assert_eq!(NamedKey::SuperRight.modifier(), Some(Modifier::Super));
        assert_eq!(NamedKey::Tab.modifier(), None);
        assert_eq!(Key::char('a').modifier(), None);
    }

    #[test]
    fn test_table_lookup_and_fallback() {
        assert_eq!(NamedKey::Backspace.symbol(), "⌫");
        assert_eq!(NamedKey::Escape.symbol(), "Esc");
        assert_eq!(NamedKey::Space.symbol(), "␣");
        assert_eq!(NamedKey::Insert.symbol(), "insert");
        assert_eq!(NamedKey::MediaVolumeUp.symbol(), "media_volume_up");
    }

    #[test]
    fn test_modifier_glyphs_per_platform() {
        assert_eq!(Platform::MacOs.modifier_glyph(Modifier::Super), "⌘+");
        assert_eq!(Platform::MacOs.modifier_glyph(Modifier::Ctrl), "⌃+");
        assert_eq!(Platform::Linux.modifier_glyph(Modifier::Ctrl), "Ctrl+");
        assert_eq!(Platform::Windows.modifier_glyph(Modifier::Super), "Win+");
        assert_eq!(Platform::Linux.modifier_glyph(Modifier::Super), "Super+");
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("Darwin".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!("windows".parse::<Platform>().unwrap(), Platform::Windows);
        assert!("beos".parse::<Platform>().is_err());
    }
}
