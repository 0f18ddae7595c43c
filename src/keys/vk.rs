//! Virtual-key code fallback
//!
//! Some hooks report a key press without a usable character (Ctrl+A on
//! Windows arrives as `\x01`). The virtual-key code is then decoded back to
//! the character printed on the key.

use super::table::Platform;

/// Windows OEM and keypad virtual-key codes (US layout)
const WINDOWS_VK_CHARS: &[(u32, char)] = &[
    (0x6A, '*'),
    (0x6B, '+'),
    (0x6D, '-'),
    (0x6E, '.'),
    (0x6F, '/'),
    (0xBA, ';'),
    (0xBB, '='),
    (0xBC, ','),
    (0xBD, '-'),
    (0xBE, '.'),
    (0xBF, '/'),
    (0xC0, '`'),
    (0xDB, '['),
    (0xDC, '\\'),
    (0xDD, ']'),
    (0xDE, '\''),
    (0xE2, '\\'),
];

/// Decode a virtual-key code into a character.
///
/// Windows codes go through the VK table; anything else (and any code the
/// table does not know) is treated as a code point.
pub fn char_from_vk(vk: u32, platform: Platform) -> Option<char> {
    if platform == Platform::Windows {
        if let Some(ch) = windows_char(vk) {
            return Some(ch);
        }
    }
    char::from_u32(vk).filter(|ch| !ch.is_control())
}

fn windows_char(vk: u32) -> Option<char> {
    match vk {
        // VK_0..VK_9 and VK_A..VK_Z share their ASCII codes
        0x30..=0x39 | 0x41..=0x5A => char::from_u32(vk),
        // VK_NUMPAD0..VK_NUMPAD9
        0x60..=0x69 => char::from_digit(vk - 0x60, 10),
        _ => WINDOWS_VK_CHARS
            .iter()
            .find(|(code, _)| *code == vk)
            .map(|(_, ch)| *ch),
    }
}

/// Windows virtual-key code for the unshifted character on a US key
pub fn windows_vk_for_char(ch: char) -> Option<u32> {
    let upper = ch.to_ascii_uppercase();
    if upper.is_ascii_digit() || upper.is_ascii_uppercase() {
        return Some(upper as u32);
    }
    WINDOWS_VK_CHARS
        .iter()
        .filter(|(code, _)| *code >= 0xBA)
        .find(|(_, c)| *c == ch)
        .map(|(code, _)| *code)
}
