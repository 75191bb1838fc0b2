//! Raw key event model shared by the decoders.

use std::time::Instant;

/// A single key press, reduced to what the decoders care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),

    /// Enter/Return, which terminates a reader burst.
    Enter,

    /// Any other named key (Shift, Tab, arrows, function keys).
    ///
    /// These never enter a decoder buffer and never reset it either.
    Other,
}

impl Key {
    /// Get the character if this is a printable key.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }
}

/// Where the key event originated, focus-wise.
///
/// Wedge scans must not fire while the user is typing into an ordinary text
/// field; the stripe decoder is deliberately field-agnostic and leaves this
/// distinction to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusOrigin {
    /// The event targeted the page at large.
    #[default]
    Page,

    /// The event targeted a text-entry field (input, textarea).
    TextEntry,
}

/// A timestamped key press as delivered by the embedding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub key: Key,

    /// When the press occurred.
    pub at: Instant,

    /// Focus target of the press.
    pub origin: FocusOrigin,
}

impl KeyEvent {
    /// Create a page-targeted printable key event.
    pub fn char(c: char, at: Instant) -> Self {
        Self {
            key: Key::Char(c),
            at,
            origin: FocusOrigin::Page,
        }
    }

    /// Create a page-targeted Enter event.
    pub fn enter(at: Instant) -> Self {
        Self {
            key: Key::Enter,
            at,
            origin: FocusOrigin::Page,
        }
    }

    /// Create a page-targeted non-printable key event.
    pub fn other(at: Instant) -> Self {
        Self {
            key: Key::Other,
            at,
            origin: FocusOrigin::Page,
        }
    }

    /// Rewrite the focus origin of this event.
    pub fn with_origin(mut self, origin: FocusOrigin) -> Self {
        self.origin = origin;
        self
    }
}
