//! Modifier key state tracking
//!
//! Remembers which modifier keys are physically held, side-aware, in the
//! order they went down.

use super::table::{Modifier, NamedKey};

/// Tracks which modifier keys are currently pressed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierState {
    /// Held modifier keys, oldest first
    held: Vec<NamedKey>,
}

impl ModifierState {
    /// Record a modifier going down. Auto-repeat of a held key is ignored.
    pub fn press(&mut self, key: NamedKey) {
        debug_assert!(key.modifier().is_some());
        if !self.held.contains(&key) {
            self.held.push(key);
        }
    }

    /// Forget a released modifier. Returns false if it was not held.
    pub fn release(&mut self, key: NamedKey) -> bool {
        match self.held.iter().position(|held| *held == key) {
            Some(index) => {
                self.held.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check if all modifiers are released
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Check if any key of the given category is held
    pub fn has(&self, modifier: Modifier) -> bool {
        self.held.iter().any(|key| key.modifier() == Some(modifier))
    }

    /// Held categories in press order, each listed once
    pub fn categories(&self) -> Vec<Modifier> {
        let mut categories = Vec::with_capacity(self.held.len());
        for modifier in self.held.iter().filter_map(|key| key.modifier()) {
            if !categories.contains(&modifier) {
                categories.push(modifier);
            }
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = ModifierState::default();
        assert!(state.is_empty());
        assert!(!state.has(Modifier::Ctrl));
        assert!(state.categories().is_empty());
    }

    #[test]
    fn test_press_and_release() {
        let mut state = ModifierState::default();
        state.press(NamedKey::CtrlLeft);
        assert!(state.has(Modifier::Ctrl));
        assert!(state.release(NamedKey::CtrlLeft));
        assert!(state.is_empty());
    }

    #[test]
    fn test_release_of_unheld_key_is_noop() {
        let mut state = ModifierState::default();
        state.press(NamedKey::AltLeft);
        assert!(!state.release(NamedKey::ShiftRight));
        assert!(state.has(Modifier::Alt));
    }

    #[test]
    fn test_sides_collapse_to_one_category() {
        let mut state = ModifierState::default();
        state.press(NamedKey::ShiftLeft);
        state.press(NamedKey::CtrlLeft);
        state.press(NamedKey::ShiftRight);
        assert_eq!(state.categories(), vec![Modifier::Shift, Modifier::Ctrl]);

        // Left shift up, right still held
        state.release(NamedKey::ShiftLeft);
        assert!(state.has(Modifier::Shift));
        assert_eq!(state.categories(), vec![Modifier::Ctrl, Modifier::Shift]);
    }

    #[test]
    fn test_auto_repeat_keeps_position() {
        let mut state = ModifierState::default();
        state.press(NamedKey::SuperLeft);
        state.press(NamedKey::AltLeft);
        state.press(NamedKey::SuperLeft);
        assert_eq!(state.categories(), vec![Modifier::Super, Modifier::Alt]);
    }
}
