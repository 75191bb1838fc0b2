//! Backend seams the session controller depends on.
//!
//! Both traits return `impl Future + Send` rather than plain `async fn` so
//! implementations can be shared with spawned tasks. Production code backs
//! them with HTTP clients; tests use in-memory fakes.

use std::future::Future;

use poolpass_core::{KioskSettings, MemberSnapshot, Result, ScanUid};

/// Member identity lookups.
pub trait MemberDirectory: Send + Sync {
    /// Resolve a scanned tag UID to a member snapshot.
    ///
    /// An unknown UID is `Ok(None)`, not an error: unknown cards are an
    /// everyday event at an unattended kiosk.
    ///
    /// # Errors
    ///
    /// Returns an error only when the directory itself cannot be consulted.
    fn lookup_by_uid(
        &self,
        uid: &ScanUid,
    ) -> impl Future<Output = Result<Option<MemberSnapshot>>> + Send;

    /// Search members by name or phone fragment.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be consulted; an empty
    /// result set is `Ok(vec![])`.
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<MemberSnapshot>>> + Send;
}

/// Source of kiosk configuration.
pub trait SettingsSource: Send + Sync {
    /// Fetch the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the source is unreachable; callers keep their
    /// previously fetched settings in that case.
    fn fetch(&self) -> impl Future<Output = Result<KioskSettings>> + Send;
}
