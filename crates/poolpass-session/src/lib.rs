//! Session layer for the kiosk: screens, context, member identity, and
//! inactivity supervision.
//!
//! The [`SessionController`] is the single writer for what the kiosk shows
//! and who it thinks is standing in front of it. Input crates hand it scans,
//! screens ask it to transition, and the [`InactivitySupervisor`] walks it
//! back to idle when nobody is there.
//!
//! Backends sit behind two seams: [`MemberDirectory`] resolves scanned tags
//! to members and [`SettingsSource`] supplies kiosk configuration. The
//! session layer never talks HTTP itself.

pub mod context;
pub mod controller;
pub mod inactivity;
pub mod screen;
pub mod traits;

pub use context::SessionContext;
pub use controller::SessionController;
pub use inactivity::{IdlePhase, InactivitySupervisor, SupervisorConfig};
pub use screen::Screen;
pub use traits::{MemberDirectory, SettingsSource};
