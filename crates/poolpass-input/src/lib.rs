//! Keystroke decoders for keyboard-emulation readers.
//!
//! Magnetic stripe readers and RFID/barcode wedges present themselves to the
//! kiosk as keyboards: a scan arrives as a fast burst of ordinary key events
//! ending with Enter. The decoders in this crate turn those undifferentiated
//! bursts back into structured scan events while letting genuine human typing
//! pass through untouched.
//!
//! Both decoders are push-driven: the embedding layer feeds every raw
//! [`KeyEvent`] (value, timestamp, focus origin) into `push()` and acts on the
//! occasional emission. Inter-keystroke deadlines are evaluated against event
//! timestamps at arrival, so the decoders own no timers and need no runtime.
//!
//! # Decoders
//!
//! - [`StripeDecoder`]: magnetic stripe track data, recognized by the `%B` /
//!   `;` track signatures, 100 ms inter-key deadline.
//! - [`WedgeDecoder`]: RFID/barcode tag UIDs, recognized by minimum length,
//!   200 ms inter-key deadline, duplicate-scan debounce.

pub mod keys;
pub mod stripe;
pub mod wedge;

pub use keys::{FocusOrigin, Key, KeyEvent};
pub use stripe::{StripeDecoder, StripeDecoderConfig, SwipeEvent};
pub use wedge::{WedgeDecoder, WedgeDecoderConfig};
