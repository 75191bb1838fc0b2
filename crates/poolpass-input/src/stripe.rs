//! Magnetic stripe decoder.
//!
//! Stripe readers in keyboard-emulation mode type an entire track in one
//! fast burst ending with Enter:
//!
//! ```text
//! Track 1: %B4242424242424242^DOE/JANE^2712...?
//! Track 2: ;4242424242424242=2712...?
//! ```
//!
//! The decoder accumulates accepted characters and, on Enter, emits the
//! buffer as a [`SwipeEvent`] when it carries a track signature. A gap longer
//! than the inter-keystroke deadline without a signature in the buffer marks
//! the content as human typing and discards it.
//!
//! The decoder is field-agnostic by contract: filtering out events that
//! belong to ordinary text-entry fields is the caller's responsibility (the
//! wedge decoder applies its own focus guard; see [`crate::wedge`]).

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use poolpass_core::constants::{STRIPE_INTERKEY_TIMEOUT, STRIPE_SYMBOLS, TRACK1_SIGNATURE, TRACK2_SIGNATURE};

use crate::keys::{Key, KeyEvent};

/// Configuration for a stripe decoder.
#[derive(Debug, Clone)]
pub struct StripeDecoderConfig {
    /// Maximum gap between keystrokes of one swipe burst.
    pub interkey_timeout: Duration,
}

impl Default for StripeDecoderConfig {
    fn default() -> Self {
        Self {
            interkey_timeout: STRIPE_INTERKEY_TIMEOUT,
        }
    }
}

/// A decoded magnetic stripe swipe.
///
/// `track_data` is the full accumulated buffer, untouched: the identity
/// backend parses track fields itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeEvent {
    /// Raw track data, including signatures and separators.
    pub track_data: String,
}

/// Push-driven magnetic stripe decoder.
///
/// Feed every raw key event through [`push`](Self::push). A `Some` return
/// carries the decoded swipe and means the terminating Enter belongs to the
/// reader burst and must be suppressed from normal input routing; `None`
/// means the event flows on as ordinary input.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use poolpass_input::{KeyEvent, StripeDecoder};
///
/// let mut decoder = StripeDecoder::new();
/// let mut at = Instant::now();
///
/// for c in "%B4242^DOE/JANE^2712?".chars() {
///     assert!(decoder.push(KeyEvent::char(c, at)).is_none());
///     at += Duration::from_millis(5);
/// }
///
/// let swipe = decoder.push(KeyEvent::enter(at)).expect("swipe");
/// assert_eq!(swipe.track_data, "%B4242^DOE/JANE^2712?");
/// ```
#[derive(Debug)]
pub struct StripeDecoder {
    config: StripeDecoderConfig,
    buffer: String,
    last_key_at: Option<Instant>,
    enabled: bool,
}

impl StripeDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(StripeDecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: StripeDecoderConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            last_key_at: None,
            enabled: true,
        }
    }

    /// Whether the decoder currently accepts input.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the decoder.
    ///
    /// Disabling clears the buffer immediately; nothing is retained across a
    /// disabled period.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.buffer.clear();
            self.last_key_at = None;
        }
    }

    /// Current buffer contents, for diagnostics and tests.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Process one key event.
    ///
    /// Returns `Some(SwipeEvent)` exactly when a terminator arrives on a
    /// buffer carrying a track signature; the caller must then suppress the
    /// terminating key from normal routing. Never fails: rejected input is
    /// silently dropped or passed through.
    pub fn push(&mut self, event: KeyEvent) -> Option<SwipeEvent> {
        if !self.enabled {
            return None;
        }

        self.discard_if_stale(event.at);

        match event.key {
            Key::Enter => {
                let data = std::mem::take(&mut self.buffer);
                self.last_key_at = None;

                if !data.is_empty() && has_track_signature(&data) {
                    debug!(len = data.len(), "stripe swipe decoded");
                    Some(SwipeEvent { track_data: data })
                } else {
                    trace!(len = data.len(), "terminator without track signature, discarding");
                    None
                }
            }
            Key::Char(c) if is_track_char(c) => {
                self.buffer.push(c);
                self.last_key_at = Some(event.at);
                None
            }
            // Modifier and unrelated keys neither extend nor reset the burst.
            _ => None,
        }
    }

    /// Drop a stale non-signature buffer before processing a new event.
    ///
    /// Equivalent to the reader-side inter-keystroke timer: data arriving
    /// slower than the deadline is human typing unless a track signature has
    /// already appeared.
    fn discard_if_stale(&mut self, now: Instant) {
        let Some(last) = self.last_key_at else {
            return;
        };
        if now.duration_since(last) > self.config.interkey_timeout
            && !has_track_signature(&self.buffer)
        {
            trace!(len = self.buffer.len(), "inter-key deadline lapsed, clearing buffer");
            self.buffer.clear();
            self.last_key_at = None;
        }
    }
}

impl Default for StripeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn has_track_signature(data: &str) -> bool {
    data.contains(TRACK1_SIGNATURE) || data.contains(TRACK2_SIGNATURE)
}

fn is_track_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || STRIPE_SYMBOLS.contains(&c)
}
