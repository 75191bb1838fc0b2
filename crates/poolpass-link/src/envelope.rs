//! Wire envelope for peripheral notifications.

use serde::{Deserialize, Serialize};

use poolpass_core::{ScanUid, constants::CARD_SCAN_EVENT};

/// Inbound notification from the scanning peripheral.
///
/// The peripheral only ever pushes; the kiosk sends nothing back. The one
/// envelope the runtime acts on is `{"event": "card_scan", "uid": "..."}`;
/// anything else is ignored so the peripheral can grow new event types
/// without breaking deployed kiosks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEnvelope {
    /// Event discriminator.
    pub event: String,

    /// Tag UID for card-scan events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl ScanEnvelope {
    /// Extract a validated scan UID if this is a card-scan envelope.
    ///
    /// Returns `None` for other event types, for card-scan envelopes missing
    /// a uid, and for uids that fail validation. The link logs those cases;
    /// none of them are errors worth surfacing.
    pub fn card_scan_uid(&self) -> Option<ScanUid> {
        if self.event != CARD_SCAN_EVENT {
            return None;
        }
        let raw = self.uid.as_deref()?;
        ScanUid::new(raw).ok()
    }
}
