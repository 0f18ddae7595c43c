//! Keyboard hook using macOS CGEventTap
//!
//! Listens to KeyDown, KeyUp and FlagsChanged on a session tap. Runs its
//! own CFRunLoop on the listener thread.

use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, EventField,
};
use tracing::{debug, error, info, warn};

use super::mac_keymap::{flags_key, key_for, modifier_down};
use super::{ListenerError, Pipeline, RawKeyEvent, Ready};
use crate::keys::{Key, NamedKey};

/// How often the run loop yields to check for stop and drain events
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the tap callback forwards to the listener loop
enum TapEvent {
    KeyDown { keycode: u16, flags: CGEventFlags },
    KeyUp { keycode: u16, flags: CGEventFlags },
    FlagsChanged { keycode: u16, flags: CGEventFlags },
    /// The system switched the tap off (slow callback or secure input)
    Disabled,
}

/// Run the CFRunLoop with the event tap until stopped
pub(super) fn run(mut pipeline: Pipeline, ready: &Ready) -> Result<(), ListenerError> {
    let (callback_tx, callback_rx) = std::sync::mpsc::channel::<TapEvent>();

    // CGEventTap callback - must be fast and non-blocking
    let callback = move |_proxy: core_graphics::event::CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
                         -> Option<CGEvent> {
        let keycode = || event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let tap_event = match event_type {
            CGEventType::KeyDown => Some(TapEvent::KeyDown {
                keycode: keycode(),
                flags: event.get_flags(),
            }),
            CGEventType::KeyUp => Some(TapEvent::KeyUp {
                keycode: keycode(),
                flags: event.get_flags(),
            }),
            CGEventType::FlagsChanged => Some(TapEvent::FlagsChanged {
                keycode: keycode(),
                flags: event.get_flags(),
            }),
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                Some(TapEvent::Disabled)
            }
            _ => None,
        };
        if let Some(tap_event) = tap_event {
            let _ = callback_tx.send(tap_event);
        }
        Some(event.clone())
    };

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::KeyDown,
            CGEventType::KeyUp,
            CGEventType::FlagsChanged,
        ],
        callback,
    )
    .map_err(|_| {
        error!("failed to create event tap - is Accessibility permission granted?");
        ListenerError::HookInstall("failed to create event tap - check Accessibility permissions".to_string())
    })?;

    tap.enable();

    let run_loop_source = tap
        .mach_port
        .create_runloop_source(0)
        .map_err(|_| ListenerError::HookInstall("failed to create run loop source".to_string()))?;
    let run_loop = CFRunLoop::get_current();

    unsafe {
        run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
    }

    info!("event tap created and enabled");
    let _ = ready.try_send(Ok(()));

    while pipeline.is_active() {
        unsafe {
            CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, POLL_INTERVAL, true);
        }

        while let Ok(tap_event) = callback_rx.try_recv() {
            if let TapEvent::Disabled = tap_event {
                // the system never re-enables a tap on its own
                warn!("event tap disabled, re-enabling");
                tap.enable();
                pipeline.resync_modifiers();
                continue;
            }

            for raw in translate(tap_event) {
                if pipeline.handle(raw).is_err() {
                    return Ok(());
                }
            }
        }
    }

    // Tap will be automatically cleaned up when it goes out of scope
    Ok(())
}

/// Turn one tap event into zero or more press/release events
fn translate(tap_event: TapEvent) -> Vec<RawKeyEvent> {
    match tap_event {
        TapEvent::KeyDown { keycode, flags } => match printable_or_named(keycode, flags) {
            Some(key) => vec![RawKeyEvent::Press(key)],
            None => {
                debug!(keycode, "unmapped keycode");
                Vec::new()
            }
        },
        TapEvent::KeyUp { keycode, flags } => printable_or_named(keycode, flags)
            .map(RawKeyEvent::Release)
            .into_iter()
            .collect(),
        TapEvent::FlagsChanged { keycode, flags } => match flags_key(keycode) {
            // Caps Lock reports each toggle once
            Some(NamedKey::CapsLock) => vec![
                RawKeyEvent::Press(Key::Named(NamedKey::CapsLock)),
                RawKeyEvent::Release(Key::Named(NamedKey::CapsLock)),
            ],
            Some(modifier) if modifier_down(modifier, flags.bits()) => {
                vec![RawKeyEvent::Press(Key::Named(modifier))]
            }
            Some(modifier) => vec![RawKeyEvent::Release(Key::Named(modifier))],
            None => Vec::new(),
        },
        TapEvent::Disabled => Vec::new(),
    }
}

fn printable_or_named(keycode: u16, flags: CGEventFlags) -> Option<Key> {
    key_for(
        keycode,
        flags.contains(CGEventFlags::CGEventFlagShift),
        flags.contains(CGEventFlags::CGEventFlagAlphaShift),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::mac_keymap::mask;

    fn flags_changed(keycode: u16, bits: u64) -> Vec<RawKeyEvent> {
        translate(TapEvent::FlagsChanged {
            keycode,
            flags: CGEventFlags::from_bits_truncate(bits),
        })
    }

    #[test]
    fn test_flags_changed_follows_event_flags() {
        assert_eq!(
            flags_changed(59, mask::CONTROL | mask::DEVICE_LCTL),
            vec![RawKeyEvent::Press(Key::Named(NamedKey::CtrlLeft))]
        );
        assert_eq!(
            flags_changed(59, 0),
            vec![RawKeyEvent::Release(Key::Named(NamedKey::CtrlLeft))]
        );
    }

    #[test]
    fn test_release_of_modifier_held_before_tap() {
        // first event seen for ⌘ is its release
        assert_eq!(
            flags_changed(55, 0),
            vec![RawKeyEvent::Release(Key::Named(NamedKey::SuperLeft))]
        );
        assert_eq!(
            flags_changed(55, 0),
            vec![RawKeyEvent::Release(Key::Named(NamedKey::SuperLeft))]
        );
    }

    #[test]
    fn test_caps_lock_is_press_and_release() {
        assert_eq!(
            flags_changed(57, 0),
            vec![
                RawKeyEvent::Press(Key::Named(NamedKey::CapsLock)),
                RawKeyEvent::Release(Key::Named(NamedKey::CapsLock)),
            ]
        );
    }

    #[test]
    fn test_disabled_tap_yields_no_keys() {
        assert!(translate(TapEvent::Disabled).is_empty());
    }

    #[test]
    fn test_key_down_uses_shift_flag() {
        let events = translate(TapEvent::KeyDown {
            keycode: 0,
            flags: CGEventFlags::CGEventFlagShift,
        });
        assert_eq!(events, vec![RawKeyEvent::Press(Key::char('A'))]);
    }
}
