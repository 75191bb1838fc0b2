//! RFID/barcode keyboard-wedge decoder.
//!
//! Wedge readers type a tag UID as a short burst of printable characters
//! ending with Enter. Unlike stripe data there is no signature to look for:
//! any terminated buffer of plausible length qualifies. The decoder applies
//! its own focus guard (events targeting text-entry fields are ignored) and a
//! duplicate-scan debounce, since a card resting on the antenna re-emits the
//! same UID repeatedly.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use poolpass_core::ScanUid;
use poolpass_core::constants::{MIN_TAG_LENGTH, SCAN_DEBOUNCE, WEDGE_INTERKEY_TIMEOUT};

use crate::keys::{FocusOrigin, Key, KeyEvent};

/// Configuration for a wedge decoder.
#[derive(Debug, Clone)]
pub struct WedgeDecoderConfig {
    /// Maximum gap between keystrokes of one scan burst.
    pub interkey_timeout: Duration,

    /// Minimum plausible tag length; shorter terminated buffers are dropped.
    pub min_tag_length: usize,

    /// Window in which a repeated identical UID is swallowed.
    pub debounce: Duration,
}

impl Default for WedgeDecoderConfig {
    fn default() -> Self {
        Self {
            interkey_timeout: WEDGE_INTERKEY_TIMEOUT,
            min_tag_length: MIN_TAG_LENGTH,
            debounce: SCAN_DEBOUNCE,
        }
    }
}

/// Push-driven keyboard-wedge decoder.
///
/// Feed every raw key event through [`push`](Self::push); a `Some` return is
/// a freshly scanned tag UID. Never fails: implausible or duplicate input is
/// silently dropped.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use poolpass_input::{KeyEvent, WedgeDecoder};
///
/// let mut decoder = WedgeDecoder::new();
/// let mut at = Instant::now();
///
/// for c in "04AB12CD".chars() {
///     assert!(decoder.push(KeyEvent::char(c, at)).is_none());
///     at += Duration::from_millis(10);
/// }
///
/// let uid = decoder.push(KeyEvent::enter(at)).expect("scan");
/// assert_eq!(uid.as_str(), "04AB12CD");
/// ```
#[derive(Debug)]
pub struct WedgeDecoder {
    config: WedgeDecoderConfig,
    buffer: String,
    last_key_at: Option<Instant>,
    last_emit: Option<(ScanUid, Instant)>,
    enabled: bool,
}

impl WedgeDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(WedgeDecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: WedgeDecoderConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            last_key_at: None,
            last_emit: None,
            enabled: true,
        }
    }

    /// Whether the decoder currently accepts input.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the decoder.
    ///
    /// Disabling clears the buffer and the debounce memory immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.buffer.clear();
            self.last_key_at = None;
            self.last_emit = None;
        }
    }

    /// Current buffer contents, for diagnostics and tests.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Process one key event.
    ///
    /// Returns `Some(ScanUid)` when a terminator closes a plausible,
    /// non-duplicate tag burst. Events originating in text-entry fields are
    /// ignored entirely so a scan can never interrupt manual typing.
    pub fn push(&mut self, event: KeyEvent) -> Option<ScanUid> {
        if !self.enabled || event.origin == FocusOrigin::TextEntry {
            return None;
        }

        self.discard_if_stale(event.at);

        match event.key {
            Key::Enter => {
                let data = std::mem::take(&mut self.buffer);
                self.last_key_at = None;

                if data.len() < self.config.min_tag_length {
                    trace!(len = data.len(), "terminated burst below minimum tag length");
                    return None;
                }

                let uid = match ScanUid::new(&data) {
                    Ok(uid) => uid,
                    Err(err) => {
                        trace!(%err, "terminated burst is not a valid UID");
                        return None;
                    }
                };

                if self.is_duplicate(&uid, event.at) {
                    trace!(%uid, "duplicate scan within debounce window, swallowing");
                    return None;
                }

                debug!(%uid, "wedge scan decoded");
                self.last_emit = Some((uid.clone(), event.at));
                Some(uid)
            }
            Key::Char(c) => {
                self.buffer.push(c);
                self.last_key_at = Some(event.at);
                None
            }
            Key::Other => None,
        }
    }

    /// Unconditionally drop a stale buffer. No signature check here: wedge
    /// bursts carry none, so any slow content is human typing.
    fn discard_if_stale(&mut self, now: Instant) {
        let Some(last) = self.last_key_at else {
            return;
        };
        if now.duration_since(last) > self.config.interkey_timeout {
            trace!(len = self.buffer.len(), "inter-key deadline lapsed, clearing buffer");
            self.buffer.clear();
            self.last_key_at = None;
        }
    }

    fn is_duplicate(&self, uid: &ScanUid, now: Instant) -> bool {
        self.last_emit.as_ref().is_some_and(|(last_uid, last_at)| {
            last_uid == uid && now.duration_since(*last_at) <= self.config.debounce
        })
    }
}

impl Default for WedgeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::FocusOrigin;
    use rstest::rstest;

    fn feed(decoder: &mut WedgeDecoder, data: &str, start: Instant, gap: Duration) -> Instant {
        let mut at = start;
        for c in data.chars() {
            decoder.push(KeyEvent::char(c, at));
            at += gap;
        }
        at
    }

    #[test]
    fn plausible_burst_emits_trimmed_uid() {
        let mut decoder = WedgeDecoder::new();
        let at = feed(&mut decoder, "04AB12CD", Instant::now(), Duration::from_millis(10));

        let uid = decoder.push(KeyEvent::enter(at)).unwrap();
        assert_eq!(uid.as_str(), "04AB12CD");
        assert!(decoder.buffered().is_empty());
    }

    #[rstest]
    #[case("abc")]
    #[case("1")]
    #[case("")]
    fn short_bursts_are_dropped(#[case] data: &str) {
        let mut decoder = WedgeDecoder::new();
        let at = feed(&mut decoder, data, Instant::now(), Duration::from_millis(10));

        assert!(decoder.push(KeyEvent::enter(at)).is_none());
    }

    #[test]
    fn text_entry_events_are_ignored() {
        let mut decoder = WedgeDecoder::new();
        let start = Instant::now();
        let mut at = start;

        for c in "04AB12CD".chars() {
            let event = KeyEvent::char(c, at).with_origin(FocusOrigin::TextEntry);
            assert!(decoder.push(event).is_none());
            at += Duration::from_millis(10);
        }
        assert!(decoder.buffered().is_empty());

        let enter = KeyEvent::enter(at).with_origin(FocusOrigin::TextEntry);
        assert!(decoder.push(enter).is_none());
    }

    #[test]
    fn slow_typing_clears_unconditionally() {
        let mut decoder = WedgeDecoder::new();
        let start = Instant::now();

        feed(&mut decoder, "04AB", start, Duration::from_millis(10));
        // Next key arrives past the 200ms deadline.
        decoder.push(KeyEvent::char('9', start + Duration::from_secs(1)));

        assert_eq!(decoder.buffered(), "9");
    }

    #[test]
    fn duplicate_uid_within_debounce_is_swallowed() {
        let mut decoder = WedgeDecoder::new();
        let start = Instant::now();

        let at = feed(&mut decoder, "04AB12CD", start, Duration::from_millis(10));
        assert!(decoder.push(KeyEvent::enter(at)).is_some());

        // Same tag re-emitted 500ms later.
        let again = at + Duration::from_millis(500);
        let at2 = feed(&mut decoder, "04AB12CD", again, Duration::from_millis(10));
        assert!(decoder.push(KeyEvent::enter(at2)).is_none());
    }

    #[test]
    fn duplicate_uid_after_debounce_emits_again() {
        let mut decoder = WedgeDecoder::new();
        let start = Instant::now();

        let at = feed(&mut decoder, "04AB12CD", start, Duration::from_millis(10));
        assert!(decoder.push(KeyEvent::enter(at)).is_some());

        let later = at + Duration::from_secs(3);
        let at2 = feed(&mut decoder, "04AB12CD", later, Duration::from_millis(10));
        assert!(decoder.push(KeyEvent::enter(at2)).is_some());
    }

    #[test]
    fn different_uid_is_never_debounced() {
        let mut decoder = WedgeDecoder::new();
        let start = Instant::now();

        let at = feed(&mut decoder, "04AB12CD", start, Duration::from_millis(10));
        assert!(decoder.push(KeyEvent::enter(at)).is_some());

        let at2 = feed(&mut decoder, "99ZZ88YY", at, Duration::from_millis(10));
        assert!(decoder.push(KeyEvent::enter(at2)).is_some());
    }

    #[test]
    fn disabling_clears_state() {
        let mut decoder = WedgeDecoder::new();
        let start = Instant::now();
        feed(&mut decoder, "04AB", start, Duration::from_millis(10));

        decoder.set_enabled(false);
        assert!(decoder.buffered().is_empty());
        assert!(decoder.push(KeyEvent::char('1', start)).is_none());
        assert!(decoder.buffered().is_empty());
    }
}
