//! keypressed: show recently pressed keys on an on-screen overlay
//!
//! Pipeline:
//! - `listener`: global keyboard hook on a dedicated thread, symbolizes
//!   each press with `keys::KeySymbolizer`
//! - `overlay`: accumulates symbols into a `KeySequence` and hides it after
//!   a period of inactivity
//! - `ipc`: pushes display updates to the overlay window
//!
//! Drawing the overlay is left to the window on the other end of the
//! socket.

pub mod config;
pub mod events;
#[cfg(unix)]
pub mod ipc;
pub mod keys;
pub mod lifecycle;
pub mod listener;
pub mod overlay;
