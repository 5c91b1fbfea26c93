#![forbid(unsafe_code)]

//! Key patterns that start, drop, cancel, and navigate a keyboard drag.

use keydrop_core::{Key, KeyEvent};

/// Keys that drop the dragged item on the focused target.
pub const DROP_KEYS: &[Key] = &[Key::Char(' '), Key::Enter];
/// Keys that cancel the active drag.
pub const CANCEL_KEYS: &[Key] = &[Key::Escape];
/// Keys whose default focus cycling is suppressed while dragging.
pub const TAB_KEYS: &[Key] = &[Key::Tab];
/// Moves to the previous eligible target.
pub const PREVIOUS_KEY: Key = Key::ArrowUp;
/// Moves to the next eligible target.
pub const NEXT_KEY: Key = Key::ArrowDown;

/// Returns true if the event's key is one of `keys`.
#[must_use]
pub fn matches_any(event: &KeyEvent, keys: &[Key]) -> bool {
    keys.contains(&event.key)
}

/// Decides whether a keydown on a drag source starts a drag.
///
/// `is_first_event` is true for the first candidate event after the backend
/// was set up. Multi-backend transition layers re-dispatch the event that
/// caused the switch as an untrusted copy without key information, and the
/// default predicate accepts that one event.
pub trait DragTrigger {
    fn is_drag_trigger(&self, event: &KeyEvent, is_first_event: bool) -> bool;
}

impl<F> DragTrigger for F
where
    F: Fn(&KeyEvent, bool) -> bool,
{
    fn is_drag_trigger(&self, event: &KeyEvent, is_first_event: bool) -> bool {
        self(event, is_first_event)
    }
}

/// Default start trigger: Ctrl+D or Cmd+D, without Alt.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardDragShortcut;

impl DragTrigger for KeyboardDragShortcut {
    fn is_drag_trigger(&self, event: &KeyEvent, is_first_event: bool) -> bool {
        is_keyboard_drag_trigger(event, is_first_event)
    }
}

/// The default start-trigger predicate.
#[must_use]
pub fn is_keyboard_drag_trigger(event: &KeyEvent, with_untrusted: bool) -> bool {
    if with_untrusted && !event.is_trusted {
        return true;
    }
    event.key.is_char_ignore_case('d') && (event.meta() || event.ctrl()) && !event.alt()
}

#[cfg(test)]
mod tests {
    use keydrop_core::Modifiers;

    use super::*;

    fn key(k: &str, mods: Modifiers) -> KeyEvent {
        KeyEvent::from_dom_key(k).with_modifiers(mods)
    }

    #[test]
    fn ctrl_or_meta_d_starts() {
        assert!(is_keyboard_drag_trigger(&key("d", Modifiers::CTRL), false));
        assert!(is_keyboard_drag_trigger(&key("D", Modifiers::META), false));
        assert!(is_keyboard_drag_trigger(
            &key("d", Modifiers::CTRL | Modifiers::SHIFT),
            false
        ));
    }

    #[test]
    fn alt_or_bare_key_does_not_start() {
        assert!(!is_keyboard_drag_trigger(&key("d", Modifiers::empty()), false));
        assert!(!is_keyboard_drag_trigger(
            &key("d", Modifiers::CTRL | Modifiers::ALT),
            false
        ));
        assert!(!is_keyboard_drag_trigger(&key("e", Modifiers::CTRL), false));
    }

    #[test]
    fn untrusted_only_on_first_event() {
        let synthetic = KeyEvent::synthetic();
        assert!(is_keyboard_drag_trigger(&synthetic, true));
        assert!(!is_keyboard_drag_trigger(&synthetic, false));
    }

    #[test]
    fn closures_are_triggers() {
        let enter_only = |event: &KeyEvent, _: bool| event.key == Key::Enter;
        assert!(enter_only.is_drag_trigger(&KeyEvent::new(Key::Enter), false));
        assert!(!enter_only.is_drag_trigger(&KeyEvent::new(Key::Escape), false));
    }

    #[test]
    fn key_sets() {
        assert!(matches_any(&KeyEvent::from_dom_key(" "), DROP_KEYS));
        assert!(matches_any(&KeyEvent::from_dom_key("Enter"), DROP_KEYS));
        assert!(matches_any(&KeyEvent::from_dom_key("Escape"), CANCEL_KEYS));
        assert!(!matches_any(&KeyEvent::from_dom_key("Tab"), CANCEL_KEYS));
    }
}
