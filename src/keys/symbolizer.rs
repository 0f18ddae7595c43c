//! Translation of raw key presses into display symbols
//!
//! Modifiers are remembered until released and prefixed to the next
//! printable or combinable key. Shift is special: when the key resolves
//! through its character, the OS has already applied shift, so the prefix
//! is dropped and the shifted character shown as is. The Shift prefix is
//! written into a template as a slot and filled in last, once the key tells
//! us whether it is needed.

use tracing::trace;

use super::modifiers::ModifierState;
use super::table::{Key, Modifier, Platform};
use super::vk::char_from_vk;

/// Placeholder for the Shift prefix inside a symbol template
const SHIFT_SLOT: &str = "{shift}";

/// Stateful translator from key events to display symbols
#[derive(Debug, Clone)]
pub struct KeySymbolizer {
    platform: Platform,
    modifiers: ModifierState,
}

impl KeySymbolizer {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            modifiers: ModifierState::default(),
        }
    }

    /// Currently held modifiers
    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    /// Forget every held modifier
    pub fn reset_modifiers(&mut self) {
        self.modifiers = ModifierState::default();
    }

    /// Handle a key press, returning the symbol to display if there is one
    pub fn on_press(&mut self, key: &Key) -> Option<String> {
        let symbol = match key {
            Key::Named(named) if named.modifier().is_some() => {
                self.modifiers.press(*named);
                return None;
            }
            Key::Named(named) if !named.is_combinable() => named.symbol().to_string(),
            _ => self.combine(key)?,
        };

        (!symbol.is_empty()).then_some(symbol)
    }

    /// Handle a key release. Only modifier releases change state.
    pub fn on_release(&mut self, key: &Key) {
        if let Key::Named(named) = key {
            if named.modifier().is_some() && !self.modifiers.release(*named) {
                trace!(key = %named, "release of a modifier that was not held");
            }
        }
    }

    /// Build "<prefixes><key>" for printable and combinable keys
    fn combine(&self, key: &Key) -> Option<String> {
        let mut template = String::new();
        let mut shift_glyph = "";

        for modifier in self.modifiers.categories() {
            let glyph = self.platform.modifier_glyph(modifier);
            if modifier == Modifier::Shift {
                template.push_str(SHIFT_SLOT);
                shift_glyph = glyph;
            } else {
                push_escaped(&mut template, glyph);
            }
        }

        let key_text = match key {
            Key::Named(named) => named.symbol().to_string(),
            Key::Printable { ch: Some(ch), .. } if is_usable(*ch) => {
                if self.modifiers.has(Modifier::Shift) {
                    shift_glyph = "";
                    ch.to_string()
                } else {
                    ch.to_lowercase().to_string()
                }
            }
            Key::Printable { vk: Some(vk), .. } => {
                char_from_vk(*vk, self.platform)?.to_lowercase().to_string()
            }
            Key::Printable { .. } => return None,
        };
        push_escaped(&mut template, &key_text);

        Some(expand(&template, shift_glyph))
    }
}

/// Characters that can be shown as they are
fn is_usable(ch: char) -> bool {
    !ch.is_control() && !ch.is_whitespace()
}

/// Append literal text to a template, doubling braces
fn push_escaped(template: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '{' || ch == '}' {
            template.push(ch);
        }
        template.push(ch);
    }
}

/// Fill the shift slots and undo brace doubling
fn expand(template: &str, shift_glyph: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(SHIFT_SLOT) {
            out.push_str(shift_glyph);
            rest = after;
        } else if let Some(after) = rest.strip_prefix("{{").or_else(|| rest.strip_prefix("}}")) {
            out.push(ch);
            rest = after;
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    out
}
