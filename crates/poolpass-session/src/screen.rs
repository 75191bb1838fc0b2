//! Screen identifiers for the kiosk UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every screen the kiosk can show.
///
/// The controller treats screens as opaque states; it never inspects what a
/// screen renders. Unknown names map to [`Screen::Idle`] so a stale deep link
/// or a backend typo can never strand the kiosk on a nonexistent screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Attract screen; the only screen that accepts device scans.
    #[default]
    Idle,
    /// Member overview after a successful scan or search.
    Member,
    /// Check-in confirmation.
    Checkin,
    /// Payment method selection.
    Payment,
    /// Cash payment recording.
    Cash,
    /// Card-on-file payment.
    Card,
    /// Split payment across methods.
    Split,
    /// Partial payment from account credit.
    CreditPartial,
    /// Member search by name or phone.
    Search,
    /// Membership plan change.
    Change,
    /// Membership status detail.
    Status,
    /// Guest admission.
    Guest,
    /// Staff PIN entry.
    Pin,
    /// Membership management menu.
    Manage,
    /// Membership freeze.
    Freeze,
    /// Saved card management.
    SavedCards,
    /// Add a new saved card.
    AddCard,
    /// Auto-charge enrollment.
    AutoCharge,
    /// New member signup.
    Signup,
    /// Profile editing.
    EditProfile,
    /// Physical terminal payment in progress.
    TerminalPayment,
}

impl Screen {
    /// Resolve a screen from its wire name, falling back to idle.
    pub fn from_name(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.to_string()))
            .unwrap_or(Screen::Idle)
    }

    /// Wire name of this screen.
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Idle => "idle",
            Screen::Member => "member",
            Screen::Checkin => "checkin",
            Screen::Payment => "payment",
            Screen::Cash => "cash",
            Screen::Card => "card",
            Screen::Split => "split",
            Screen::CreditPartial => "credit_partial",
            Screen::Search => "search",
            Screen::Change => "change",
            Screen::Status => "status",
            Screen::Guest => "guest",
            Screen::Pin => "pin",
            Screen::Manage => "manage",
            Screen::Freeze => "freeze",
            Screen::SavedCards => "saved_cards",
            Screen::AddCard => "add_card",
            Screen::AutoCharge => "auto_charge",
            Screen::Signup => "signup",
            Screen::EditProfile => "edit_profile",
            Screen::TerminalPayment => "terminal_payment",
        }
    }

    /// Whether this is the attract screen.
    pub fn is_idle(&self) -> bool {
        matches!(self, Screen::Idle)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Screen {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Screen::from_name(s))
    }
}
