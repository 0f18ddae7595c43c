//! Key model and symbolization
//!
//! Turns raw press/release events from the keyboard hook into the short
//! strings shown on the overlay.

mod modifiers;
mod symbolizer;
mod table;
pub mod vk;

pub use modifiers::ModifierState;
pub use symbolizer::KeySymbolizer;
pub use table::{Key, Modifier, NamedKey, Platform};
