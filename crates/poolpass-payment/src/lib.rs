//! Terminal-payment orchestration for the kiosk.
//!
//! A card payment at the kiosk is a conversation with a backend that drives
//! the physical terminal: the kiosk asks it to start collecting, then polls
//! until the cardholder pays, the processor declines, the kiosk cancels, or
//! a poll budget runs out. This crate holds the gateway abstraction
//! ([`PaymentGateway`]) and the polling state machine ([`TerminalPayment`])
//! that runs one attempt end to end.
//!
//! The orchestrator publishes its [`PaymentPhase`] on a watch channel; the
//! screen layer renders whatever phase it observes and never drives the
//! protocol itself.

pub mod gateway;
pub mod orchestrator;

pub use gateway::{
    CardSummary, GatewayError, GatewayResult, InitiateOutcome, InitiateRequest, PaymentGateway,
    PollOutcome,
};
pub use orchestrator::{PaymentConfig, PaymentPhase, TerminalPayment};
