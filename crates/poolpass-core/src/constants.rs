//! Core constants for the kiosk interaction runtime.
//!
//! This module centralizes the timing and protocol constants shared by the
//! input decoders, the remote-scan link, the inactivity supervisor, and the
//! terminal-payment orchestrator. Keeping them in one place makes the timer
//! domains auditable: each component owns exactly one of these intervals and
//! nothing else fires on its behalf.
//!
//! # Timer Domains
//!
//! | Constant | Owner | Purpose |
//! |----------|-------|---------|
//! | [`STRIPE_INTERKEY_TIMEOUT`] | stripe decoder | gap that separates a swipe burst from human typing |
//! | [`WEDGE_INTERKEY_TIMEOUT`] | wedge decoder | gap that separates a tag burst from human typing |
//! | [`SCAN_DEBOUNCE`] | wedge decoder | window in which a repeated tag UID is swallowed |
//! | [`RECONNECT_DELAY`] | remote-scan link | fixed delay before a reconnect attempt |
//! | [`POLL_INTERVAL`] | payment orchestrator | spacing between terminal status polls |
//! | [`WARNING_TICK`] | inactivity supervisor | countdown granularity during the warning phase |

use std::time::Duration;

// ============================================================================
// Magnetic stripe track signatures
// ============================================================================

/// Track-1 signature emitted by magnetic stripe readers in keyboard mode.
///
/// Track 1 data has the shape `%B<pan>^<name>^<exp>...?`. A buffer containing
/// this substring is treated as stripe data rather than typed input.
pub const TRACK1_SIGNATURE: &str = "%B";

/// Track-2 signature emitted by magnetic stripe readers in keyboard mode.
///
/// Track 2 data has the shape `;<pan>=<exp>...?`.
pub const TRACK2_SIGNATURE: &str = ";";

/// Symbol characters that may legitimately appear in track data.
///
/// Alphanumerics plus this set are the only characters a stripe decoder
/// accepts into its buffer; everything else is ignored without resetting it.
pub const STRIPE_SYMBOLS: &[char] = &['%', '^', ';', '=', '?'];

// ============================================================================
// Decoder timing
// ============================================================================

/// Maximum gap between keystrokes of a single stripe swipe.
///
/// Card readers in keyboard-emulation mode type track data far faster than a
/// human can. A gap longer than this (without a track signature already in
/// the buffer) means the input is ordinary typing and the buffer is stale.
pub const STRIPE_INTERKEY_TIMEOUT: Duration = Duration::from_millis(100);

/// Maximum gap between keystrokes of a single wedge (RFID/barcode) scan.
pub const WEDGE_INTERKEY_TIMEOUT: Duration = Duration::from_millis(200);

/// Minimum plausible tag length for a wedge scan.
///
/// Terminated buffers shorter than this are discarded rather than emitted.
pub const MIN_TAG_LENGTH: usize = 4;

/// Window in which a repeat scan of the same tag UID is ignored.
///
/// RFID wedges often re-emit while a card rests on the antenna.
pub const SCAN_DEBOUNCE: Duration = Duration::from_millis(2000);

// ============================================================================
// Remote-scan link
// ============================================================================

/// Fixed delay before the remote-scan link retries a dropped connection.
///
/// The link retries indefinitely at this cadence while enabled; there is no
/// exponential backoff and no retry cap.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Envelope event name announcing a card scan from the peripheral.
pub const CARD_SCAN_EVENT: &str = "card_scan";

// ============================================================================
// Terminal payment polling
// ============================================================================

/// Spacing between terminal-payment status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Hard cap on poll attempts before the payment is declared timed out.
///
/// 80 attempts at [`POLL_INTERVAL`] is roughly two minutes of waiting for a
/// card to be presented at the terminal.
pub const MAX_POLL_ATTEMPTS: u32 = 80;

// ============================================================================
// Inactivity supervision
// ============================================================================

/// Countdown granularity during the warning phase.
pub const WARNING_TICK: Duration = Duration::from_secs(1);

/// Fallback idle time before the warning overlay appears.
pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 30;

/// Fallback warning countdown length.
pub const DEFAULT_INACTIVITY_WARNING_SECS: u64 = 10;

/// Fallback delay before a completed check-in returns to the idle screen.
pub const DEFAULT_CHECKIN_RETURN_SECS: u64 = 8;

// ============================================================================
// Kiosk settings fallbacks
// ============================================================================

/// Currency symbol used when the settings source supplies none.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Facility name used when the settings source supplies none.
pub const DEFAULT_POOL_NAME: &str = "Pool";

/// Maximum guests per family visit when the settings source supplies none.
pub const DEFAULT_MAX_GUESTS: u32 = 5;

// ============================================================================
// Scan UID validation
// ============================================================================

/// Minimum length of a scan UID accepted from any input path.
pub const MIN_UID_LENGTH: usize = 1;

/// Maximum length of a scan UID accepted from any input path.
pub const MAX_UID_LENGTH: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_budget_spans_about_two_minutes() {
        let total = POLL_INTERVAL * MAX_POLL_ATTEMPTS;
        assert_eq!(total, Duration::from_secs(120));
    }

    #[test]
    fn wedge_timeout_is_looser_than_stripe() {
        assert!(WEDGE_INTERKEY_TIMEOUT > STRIPE_INTERKEY_TIMEOUT);
    }

    #[test]
    fn signatures_are_distinct() {
        assert_ne!(TRACK1_SIGNATURE, TRACK2_SIGNATURE);
        assert!(STRIPE_SYMBOLS.contains(&'%'));
        assert!(STRIPE_SYMBOLS.contains(&';'));
    }
}
