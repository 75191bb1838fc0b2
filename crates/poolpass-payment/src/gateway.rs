//! Payment gateway abstraction.
//!
//! The card terminal is driven by a backend service; the kiosk never talks
//! to the terminal directly. This module defines the three-call surface the
//! orchestrator needs: start a payment, poll its status, and ask for a
//! best-effort cancel.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use poolpass_core::{CorrelationKey, MemberId};

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Transport-level gateway failures.
///
/// These cover the call not completing at all. A payment that the backend
/// processed and declined is not an error; it comes back as a
/// [`PollOutcome::Declined`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend could not be reached or the call timed out.
    #[error("Gateway transport failure: {0}")]
    Transport(String),

    /// The backend answered with something the kiosk cannot parse.
    #[error("Malformed gateway response: {0}")]
    Decode(String),
}

/// Everything the backend needs to start a terminal payment.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateRequest {
    /// Member the charge is for.
    pub member_id: MemberId,

    /// Plan or product being purchased.
    pub plan_id: i64,

    /// Staff PIN authorizing the charge, when the flow collected one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,

    /// Save the presented card on file for later charges.
    pub save_card: bool,

    /// Apply available account credit before charging the card.
    pub use_credit: bool,
}

/// Backend verdict on an initiation request.
#[derive(Debug, Clone)]
pub enum InitiateOutcome {
    /// The terminal is prompting for a card; poll with this key.
    Accepted {
        /// Key correlating every later poll and cancel to this payment.
        key: CorrelationKey,
    },

    /// The backend refused to start the payment at all.
    Rejected {
        /// Operator-facing refusal reason.
        reason: String,
    },
}

/// Card details echoed back with an approved payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    /// Last four digits of the card number, when the terminal reports them.
    #[serde(default)]
    pub last4: Option<String>,

    /// Card brand, e.g. "visa".
    #[serde(default)]
    pub brand: Option<String>,
}

/// One status poll result.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Still waiting on the cardholder or the processor.
    Pending,

    /// Payment approved.
    Approved {
        /// Card details for the receipt, as far as the terminal knows them.
        card: CardSummary,
    },

    /// Payment declined by the processor.
    Declined {
        /// Cardholder-facing decline reason.
        reason: String,
    },

    /// The terminal gave up on this payment and will not recover.
    Failed {
        /// Operator-facing failure reason.
        reason: String,
    },
}

/// Backend driving the physical card terminal.
///
/// Methods return `impl Future + Send` rather than plain `async fn` so the
/// orchestrator can run implementations inside a spawned task.
pub trait PaymentGateway: Send + Sync {
    /// Ask the backend to put the terminal into collect mode.
    fn initiate(
        &self,
        request: InitiateRequest,
    ) -> impl Future<Output = GatewayResult<InitiateOutcome>> + Send;

    /// Poll the status of a previously initiated payment.
    fn poll(&self, key: &CorrelationKey) -> impl Future<Output = GatewayResult<PollOutcome>> + Send;

    /// Best-effort cancel of an in-flight payment.
    ///
    /// # Errors
    ///
    /// Transport failures are returned but callers are expected to log and
    /// move on; the kiosk-side payment is already over when this is called.
    fn cancel(&self, key: &CorrelationKey) -> impl Future<Output = GatewayResult<()>> + Send;
}
