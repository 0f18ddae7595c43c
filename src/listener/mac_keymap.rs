//! macOS virtual keycodes (kVK_*) for the ANSI layout

use crate::keys::{Key, NamedKey};

/// Keycodes reported through FlagsChanged
pub(super) fn flags_key(keycode: u16) -> Option<NamedKey> {
    let key = match keycode {
        54 => NamedKey::SuperRight,
        55 => NamedKey::SuperLeft,
        56 => NamedKey::ShiftLeft,
        57 => NamedKey::CapsLock,
        58 => NamedKey::AltLeft,
        59 => NamedKey::CtrlLeft,
        60 => NamedKey::ShiftRight,
        61 => NamedKey::AltRight,
        62 => NamedKey::CtrlRight,
        _ => return None,
    };
    Some(key)
}

/// CGEventFlags bits, raw so the tables stay testable off macOS
pub(super) mod mask {
    pub const SHIFT: u64 = 0x0002_0000;
    pub const CONTROL: u64 = 0x0004_0000;
    pub const ALTERNATE: u64 = 0x0008_0000;
    pub const COMMAND: u64 = 0x0010_0000;

    // NX_DEVICE*KEYMASK, one bit per physical side
    pub const DEVICE_LCTL: u64 = 0x0000_0001;
    pub const DEVICE_LSHIFT: u64 = 0x0000_0002;
    pub const DEVICE_RSHIFT: u64 = 0x0000_0004;
    pub const DEVICE_LCMD: u64 = 0x0000_0008;
    pub const DEVICE_RCMD: u64 = 0x0000_0010;
    pub const DEVICE_LALT: u64 = 0x0000_0020;
    pub const DEVICE_RALT: u64 = 0x0000_0040;
    pub const DEVICE_RCTL: u64 = 0x0000_2000;
}

/// Whether a FlagsChanged for `key` leaves it down, judged from the event flags.
///
/// The side bit decides when the event carries any side bits for that
/// modifier; otherwise (synthetic events) the category bit does.
pub(super) fn modifier_down(key: NamedKey, flags: u64) -> bool {
    let (category, side, both_sides) = match key {
        NamedKey::CtrlLeft => (mask::CONTROL, mask::DEVICE_LCTL, mask::DEVICE_LCTL | mask::DEVICE_RCTL),
        NamedKey::CtrlRight => (mask::CONTROL, mask::DEVICE_RCTL, mask::DEVICE_LCTL | mask::DEVICE_RCTL),
        NamedKey::ShiftLeft => (mask::SHIFT, mask::DEVICE_LSHIFT, mask::DEVICE_LSHIFT | mask::DEVICE_RSHIFT),
        NamedKey::ShiftRight => (mask::SHIFT, mask::DEVICE_RSHIFT, mask::DEVICE_LSHIFT | mask::DEVICE_RSHIFT),
        NamedKey::AltLeft => (mask::ALTERNATE, mask::DEVICE_LALT, mask::DEVICE_LALT | mask::DEVICE_RALT),
        NamedKey::AltRight => (mask::ALTERNATE, mask::DEVICE_RALT, mask::DEVICE_LALT | mask::DEVICE_RALT),
        NamedKey::SuperLeft => (mask::COMMAND, mask::DEVICE_LCMD, mask::DEVICE_LCMD | mask::DEVICE_RCMD),
        NamedKey::SuperRight => (mask::COMMAND, mask::DEVICE_RCMD, mask::DEVICE_LCMD | mask::DEVICE_RCMD),
        _ => return false,
    };

    if flags & category == 0 {
        false
    } else if flags & both_sides != 0 {
        flags & side != 0
    } else {
        true
    }
}

fn named_key(keycode: u16) -> Option<NamedKey> {
    let key = match keycode {
        36 | 76 => NamedKey::Enter,
        48 => NamedKey::Tab,
        49 => NamedKey::Space,
        51 => NamedKey::Backspace,
        53 => NamedKey::Escape,
        71 => NamedKey::NumLock,
        96 => NamedKey::F5,
        97 => NamedKey::F6,
        98 => NamedKey::F7,
        99 => NamedKey::F3,
        100 => NamedKey::F8,
        101 => NamedKey::F9,
        103 => NamedKey::F11,
        109 => NamedKey::F10,
        110 => NamedKey::Menu,
        111 => NamedKey::F12,
        114 => NamedKey::Insert,
        115 => NamedKey::Home,
        116 => NamedKey::PageUp,
        117 => NamedKey::Delete,
        118 => NamedKey::F4,
        119 => NamedKey::End,
        120 => NamedKey::F2,
        121 => NamedKey::PageDown,
        122 => NamedKey::F1,
        123 => NamedKey::Left,
        124 => NamedKey::Right,
        125 => NamedKey::Down,
        126 => NamedKey::Up,
        _ => return None,
    };
    Some(key)
}

/// Unshifted and shifted character of a character key
fn ansi_chars(keycode: u16) -> Option<(char, char)> {
    let letter = match keycode {
        0 => 'a',
        1 => 's',
        2 => 'd',
        3 => 'f',
        4 => 'h',
        5 => 'g',
        6 => 'z',
        7 => 'x',
        8 => 'c',
        9 => 'v',
        11 => 'b',
        12 => 'q',
        13 => 'w',
        14 => 'e',
        15 => 'r',
        16 => 'y',
        17 => 't',
        31 => 'o',
        32 => 'u',
        34 => 'i',
        35 => 'p',
        37 => 'l',
        38 => 'j',
        40 => 'k',
        45 => 'n',
        46 => 'm',
        _ => {
            let pair = match keycode {
                18 => ('1', '!'),
                19 => ('2', '@'),
                20 => ('3', '#'),
                21 => ('4', '$'),
                22 => ('6', '^'),
                23 => ('5', '%'),
                24 => ('=', '+'),
                25 => ('9', '('),
                26 => ('7', '&'),
                27 => ('-', '_'),
                28 => ('8', '*'),
                29 => ('0', ')'),
                30 => (']', '}'),
                33 => ('[', '{'),
                39 => ('\'', '"'),
                41 => (';', ':'),
                42 => ('\\', '|'),
                43 => (',', '<'),
                44 => ('/', '?'),
                47 => ('.', '>'),
                50 => ('`', '~'),
                // keypad
                65 => ('.', '.'),
                67 => ('*', '*'),
                69 => ('+', '+'),
                75 => ('/', '/'),
                78 => ('-', '-'),
                81 => ('=', '='),
                82 => ('0', '0'),
                83 => ('1', '1'),
                84 => ('2', '2'),
                85 => ('3', '3'),
                86 => ('4', '4'),
                87 => ('5', '5'),
                88 => ('6', '6'),
                89 => ('7', '7'),
                91 => ('8', '8'),
                92 => ('9', '9'),
                _ => return None,
            };
            return Some(pair);
        }
    };
    Some((letter, letter.to_ascii_uppercase()))
}

/// Key for a KeyDown/KeyUp keycode.
///
/// Caps Lock only affects letters.
pub(super) fn key_for(keycode: u16, shift: bool, caps_lock: bool) -> Option<Key> {
    if let Some(named) = named_key(keycode) {
        return Some(Key::Named(named));
    }

    let (plain, shifted) = ansi_chars(keycode)?;
    let upper = if plain.is_ascii_alphabetic() {
        shift != caps_lock
    } else {
        shift
    };

    Some(Key::Printable {
        ch: Some(if upper { shifted } else { plain }),
        vk: None,
    })
}
