//! Keyboard hook for Windows/Linux using rdev
//!
//! `rdev::listen` blocks the listener thread for the life of the hook and
//! cannot be cancelled. Stopping ends the pipeline's session, after which
//! the callback drops every event, including after a later restart.

use rdev::{listen, Event, EventType, Key as RdevKey};

use super::{ListenerError, Pipeline, RawKeyEvent, Ready};
use crate::keys::{vk, Key, NamedKey};

/// Block on the rdev hook, feeding events into the pipeline
pub(super) fn run(mut pipeline: Pipeline, _ready: &Ready) -> Result<(), ListenerError> {
    let callback = move |event: Event| {
        if !pipeline.is_active() {
            return;
        }
        if let Some(raw) = translate(&event) {
            // a closed channel ends the session inside the pipeline
            let _ = pipeline.handle(raw);
        }
    };

    listen(callback).map_err(|e| ListenerError::HookInstall(format!("{:?}", e)))
}

fn translate(event: &Event) -> Option<RawKeyEvent> {
    match event.event_type {
        EventType::KeyPress(key) => Some(RawKeyEvent::Press(map_key(key, event.name.as_deref()))),
        EventType::KeyRelease(key) => Some(RawKeyEvent::Release(map_key(key, None))),
        _ => None,
    }
}

fn map_key(key: RdevKey, name: Option<&str>) -> Key {
    match named_key(key) {
        Some(named) => Key::Named(named),
        None => Key::Printable {
            ch: name.and_then(single_char),
            vk: vk_code(key),
        },
    }
}

fn single_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

fn named_key(key: RdevKey) -> Option<NamedKey> {
    let named = match key {
        RdevKey::Alt => NamedKey::AltLeft,
        RdevKey::AltGr => NamedKey::AltGr,
        RdevKey::ControlLeft => NamedKey::CtrlLeft,
        RdevKey::ControlRight => NamedKey::CtrlRight,
        RdevKey::ShiftLeft => NamedKey::ShiftLeft,
        RdevKey::ShiftRight => NamedKey::ShiftRight,
        RdevKey::MetaLeft => NamedKey::SuperLeft,
        RdevKey::MetaRight => NamedKey::SuperRight,
        RdevKey::Backspace => NamedKey::Backspace,
        RdevKey::Tab => NamedKey::Tab,
        RdevKey::Return | RdevKey::KpReturn => NamedKey::Enter,
        RdevKey::Escape => NamedKey::Escape,
        RdevKey::Space => NamedKey::Space,
        RdevKey::Delete => NamedKey::Delete,
        RdevKey::Insert => NamedKey::Insert,
        RdevKey::Home => NamedKey::Home,
        RdevKey::End => NamedKey::End,
        RdevKey::PageUp => NamedKey::PageUp,
        RdevKey::PageDown => NamedKey::PageDown,
        RdevKey::UpArrow => NamedKey::Up,
        RdevKey::DownArrow => NamedKey::Down,
        RdevKey::LeftArrow => NamedKey::Left,
        RdevKey::RightArrow => NamedKey::Right,
        RdevKey::F1 => NamedKey::F1,
        RdevKey::F2 => NamedKey::F2,
        RdevKey::F3 => NamedKey::F3,
        RdevKey::F4 => NamedKey::F4,
        RdevKey::F5 => NamedKey::F5,
        RdevKey::F6 => NamedKey::F6,
        RdevKey::F7 => NamedKey::F7,
        RdevKey::F8 => NamedKey::F8,
        RdevKey::F9 => NamedKey::F9,
        RdevKey::F10 => NamedKey::F10,
        RdevKey::F11 => NamedKey::F11,
        RdevKey::F12 => NamedKey::F12,
        RdevKey::CapsLock => NamedKey::CapsLock,
        RdevKey::NumLock => NamedKey::NumLock,
        RdevKey::ScrollLock => NamedKey::ScrollLock,
        RdevKey::PrintScreen => NamedKey::PrintScreen,
        RdevKey::Pause => NamedKey::Pause,
        _ => return None,
    };
    Some(named)
}

/// Character printed on the key, US layout, unshifted
fn base_char(key: RdevKey) -> Option<char> {
    let ch = match key {
        RdevKey::KeyA => 'a',
        RdevKey::KeyB => 'b',
        RdevKey::KeyC => 'c',
        RdevKey::KeyD => 'd',
        RdevKey::KeyE => 'e',
        RdevKey::KeyF => 'f',
        RdevKey::KeyG => 'g',
        RdevKey::KeyH => 'h',
        RdevKey::KeyI => 'i',
        RdevKey::KeyJ => 'j',
        RdevKey::KeyK => 'k',
        RdevKey::KeyL => 'l',
        RdevKey::KeyM => 'm',
        RdevKey::KeyN => 'n',
        RdevKey::KeyO => 'o',
        RdevKey::KeyP => 'p',
        RdevKey::KeyQ => 'q',
        RdevKey::KeyR => 'r',
        RdevKey::KeyS => 's',
        RdevKey::KeyT => 't',
        RdevKey::KeyU => 'u',
        RdevKey::KeyV => 'v',
        RdevKey::KeyW => 'w',
        RdevKey::KeyX => 'x',
        RdevKey::KeyY => 'y',
        RdevKey::KeyZ => 'z',
        RdevKey::Num0 | RdevKey::Kp0 => '0',
        RdevKey::Num1 | RdevKey::Kp1 => '1',
        RdevKey::Num2 | RdevKey::Kp2 => '2',
        RdevKey::Num3 | RdevKey::Kp3 => '3',
        RdevKey::Num4 | RdevKey::Kp4 => '4',
        RdevKey::Num5 | RdevKey::Kp5 => '5',
        RdevKey::Num6 | RdevKey::Kp6 => '6',
        RdevKey::Num7 | RdevKey::Kp7 => '7',
        RdevKey::Num8 | RdevKey::Kp8 => '8',
        RdevKey::Num9 | RdevKey::Kp9 => '9',
        RdevKey::BackQuote => '`',
        RdevKey::Minus | RdevKey::KpMinus => '-',
        RdevKey::Equal => '=',
        RdevKey::LeftBracket => '[',
        RdevKey::RightBracket => ']',
        RdevKey::SemiColon => ';',
        RdevKey::Quote => '\'',
        RdevKey::BackSlash | RdevKey::IntlBackslash => '\\',
        RdevKey::Comma => ',',
        RdevKey::Dot | RdevKey::KpDelete => '.',
        RdevKey::Slash | RdevKey::KpDivide => '/',
        RdevKey::KpPlus => '+',
        RdevKey::KpMultiply => '*',
        _ => return None,
    };
    Some(ch)
}

/// Virtual-key code in the convention `keys::vk` decodes for this OS
fn vk_code(key: RdevKey) -> Option<u32> {
    if let RdevKey::Unknown(code) = key {
        // only Windows reports real virtual-key codes here
        return cfg!(target_os = "windows").then_some(code);
    }

    let ch = base_char(key)?;
    if cfg!(target_os = "windows") {
        vk::windows_vk_for_char(ch).or(Some(ch as u32))
    } else {
        Some(ch as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn event(event_type: EventType, name: Option<&str>) -> Event {
        Event {
            time: SystemTime::now(),
            name: name.map(str::to_string),
            event_type,
        }
    }

    #[test]
    fn test_press_carries_character() {
        let raw = translate(&event(EventType::KeyPress(RdevKey::KeyA), Some("A")));
        assert_eq!(
            raw,
            Some(RawKeyEvent::Press(Key::Printable {
                ch: Some('A'),
                vk: vk_code(RdevKey::KeyA),
            }))
        );
    }

    #[test]
    fn test_modifiers_and_named_keys() {
        assert_eq!(
            translate(&event(EventType::KeyPress(RdevKey::ControlRight), None)),
            Some(RawKeyEvent::Press(Key::Named(NamedKey::CtrlRight)))
        );
        assert_eq!(
            translate(&event(EventType::KeyRelease(RdevKey::MetaLeft), None)),
            Some(RawKeyEvent::Release(Key::Named(NamedKey::SuperLeft)))
        );
        assert_eq!(
            translate(&event(EventType::KeyPress(RdevKey::Backspace), Some("\u{8}"))),
            Some(RawKeyEvent::Press(Key::Named(NamedKey::Backspace)))
        );
    }

    #[test]
    fn test_multi_char_names_are_dropped() {
        assert_eq!(single_char("ab"), None);
        assert_eq!(single_char(""), None);
        assert_eq!(single_char("é"), Some('é'));
    }

    #[test]
    fn test_non_key_events_ignored() {
        assert_eq!(translate(&event(EventType::MouseMove { x: 1.0, y: 2.0 }, None)), None);
    }

    #[test]
    fn test_vk_decodes_to_base_char() {
        use crate::keys::Platform;

        let platform = Platform::current();
        for key in [RdevKey::KeyK, RdevKey::Num4, RdevKey::SemiColon, RdevKey::LeftBracket] {
            let code = vk_code(key).unwrap();
            assert_eq!(vk::char_from_vk(code, platform), base_char(key).map(|c| {
                if platform == Platform::Windows { c.to_ascii_uppercase() } else { c }
            }));
        }
    }
}
