#![forbid(unsafe_code)]

//! Keydown events as seen by the backend.
//!
//! [`KeyEvent`] mirrors the parts of a DOM `KeyboardEvent` the backend reads:
//! the logical key, modifier state, whether the event was produced by the
//! user agent (`is_trusted`), and the three propagation flags a listener can
//! set. Hosts either build events directly or decode the JSON shape produced
//! by a browser shim with [`KeyEvent::from_json`].

use bitflags::bitflags;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Logical key value (the DOM `key` property).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, including `' '` for the space bar.
    Char(char),
    Enter,
    Escape,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Shift,
    Control,
    Alt,
    Meta,
    /// Any other named key, kept verbatim.
    Named(String),
    /// No key information (synthetic events cloned from a plain `Event`).
    Unidentified,
}

impl Key {
    /// Map a DOM `key` string to a [`Key`].
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "" | "Unidentified" => Self::Unidentified,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "Shift" => Self::Shift,
            "Control" => Self::Control,
            "Alt" => Self::Alt,
            "Meta" => Self::Meta,
            "Spacebar" => Self::Char(' '),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Named(other.to_owned()),
                }
            }
        }
    }

    /// Returns true if this is the given character, ignoring ASCII case.
    #[must_use]
    pub fn is_char_ignore_case(&self, expected: char) -> bool {
        matches!(self, Self::Char(c) if c.eq_ignore_ascii_case(&expected))
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT = 0b0010;
        const CTRL = 0b0100;
        const META = 0b1000;
    }
}

// ---------------------------------------------------------------------------
// KeyEvent
// ---------------------------------------------------------------------------

/// A keydown event flowing through the backend's listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// False for events constructed by script rather than the user agent.
    pub is_trusted: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl KeyEvent {
    /// Create a trusted keydown with no modifiers.
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            is_trusted: true,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    /// Create a trusted keydown from a DOM `key` string.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        Self::new(Key::from_dom_key(key))
    }

    /// An untrusted event without key information, as re-dispatched by
    /// multi-backend transition layers.
    #[must_use]
    pub fn synthetic() -> Self {
        Self {
            is_trusted: false,
            ..Self::new(Key::Unidentified)
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_trusted(mut self, trusted: bool) -> Self {
        self.is_trusted = trusted;
        self
    }

    #[inline]
    #[must_use]
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[inline]
    #[must_use]
    pub fn meta(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }

    #[inline]
    #[must_use]
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[inline]
    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Suppress the user agent's default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stop the event before it reaches the next current target.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop the event before any further listener, including ones on the
    /// current target.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Prevent default and stop propagation in one step.
    pub fn stop(&mut self) {
        self.prevent_default();
        self.stop_propagation();
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    #[must_use]
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    /// Decode a JSON-encoded keydown (`{"key":"d","ctrlKey":true,...}`).
    ///
    /// A missing `key` yields [`Key::Unidentified`]; a missing `isTrusted`
    /// is treated as trusted.
    pub fn from_json(json: &str) -> Result<Self, KeyEventParseError> {
        let raw: RawKeyEvent =
            serde_json::from_str(json).map_err(|e| KeyEventParseError::Json(e.to_string()))?;
        if let Some(kind) = raw.kind.as_deref()
            && kind != "keydown"
        {
            return Err(KeyEventParseError::UnsupportedType(kind.to_owned()));
        }

        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, raw.shift_key);
        modifiers.set(Modifiers::ALT, raw.alt_key);
        modifiers.set(Modifiers::CTRL, raw.ctrl_key);
        modifiers.set(Modifiers::META, raw.meta_key);

        let key = raw
            .key
            .as_deref()
            .map_or(Key::Unidentified, Key::from_dom_key);
        Ok(Self::new(key)
            .with_modifiers(modifiers)
            .with_trusted(raw.is_trusted.unwrap_or(true)))
    }
}

/// Errors from decoding JSON-encoded key events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEventParseError {
    /// Malformed JSON.
    Json(String),
    /// The event type was present but not `keydown`.
    UnsupportedType(String),
}

impl core::fmt::Display for KeyEventParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::UnsupportedType(kind) => write!(f, "unsupported event type: {kind}"),
        }
    }
}

impl std::error::Error for KeyEventParseError {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKeyEvent {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    shift_key: bool,
    #[serde(default)]
    alt_key: bool,
    #[serde(default)]
    ctrl_key: bool,
    #[serde(default)]
    meta_key: bool,
    #[serde(default)]
    is_trusted: Option<bool>,
}
