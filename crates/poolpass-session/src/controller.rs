//! Session controller: current screen, member, and context.
//!
//! The controller is the single writer for session state. Screens ask it to
//! transition; input devices hand it scans; the inactivity supervisor asks it
//! to return to idle. It never runs its own timers.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use poolpass_core::{ActivityBus, KioskSettings, MemberSnapshot, ScanUid};

use crate::context::SessionContext;
use crate::screen::Screen;
use crate::traits::{MemberDirectory, SettingsSource};

/// Kiosk session state machine.
///
/// One controller lives for the whole kiosk process; "sessions" are the
/// stretches between return-to-idle calls. Every user-driven transition is
/// reported to the activity bus so the inactivity supervisor sees it.
pub struct SessionController<D, S> {
    directory: D,
    settings_source: S,
    activity: ActivityBus,
    screen: Screen,
    context: SessionContext,
    member: Option<MemberSnapshot>,
    settings: KioskSettings,
}

impl<D, S> SessionController<D, S>
where
    D: MemberDirectory,
    S: SettingsSource,
{
    /// Controller starting on the idle screen with default settings.
    pub fn new(directory: D, settings_source: S, activity: ActivityBus) -> Self {
        Self {
            directory,
            settings_source,
            activity,
            screen: Screen::Idle,
            context: SessionContext::new(),
            member: None,
            settings: KioskSettings::default(),
        }
    }

    /// Fetch settings for the first time.
    ///
    /// A failed fetch keeps the built-in defaults; the kiosk must come up
    /// even when the backend is briefly away.
    pub async fn bootstrap(&mut self) {
        self.refresh_settings().await;
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Current session context.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Currently identified member, if any.
    pub fn member(&self) -> Option<&MemberSnapshot> {
        self.member.as_ref()
    }

    /// Current settings.
    pub fn settings(&self) -> &KioskSettings {
        &self.settings
    }

    /// Move to a screen, merging an optional context patch.
    ///
    /// The patch merges key-by-key; context set by earlier screens survives
    /// unless a key collides. Transitions count as user activity.
    pub fn transition(&mut self, screen: Screen, patch: Option<Map<String, Value>>) {
        debug!(from = %self.screen, to = %screen, "screen transition");
        if let Some(patch) = patch {
            self.context.merge(patch);
        }
        self.screen = screen;
        self.activity.signal();
    }

    /// Replace the identified member.
    ///
    /// Search and signup flows identify members without a scan; they land
    /// their snapshot here before transitioning.
    pub fn set_member(&mut self, snapshot: MemberSnapshot) {
        self.member = Some(snapshot);
    }

    /// Search the member directory for the search screen.
    ///
    /// Searching counts as user activity; picking a result goes through
    /// [`set_member`](Self::set_member) plus a transition.
    ///
    /// # Errors
    ///
    /// Propagates directory errors so the search screen can show a retry
    /// prompt; unlike scans, the user is actively waiting on this call.
    pub async fn search_members(
        &self,
        query: &str,
    ) -> poolpass_core::Result<Vec<MemberSnapshot>> {
        self.activity.signal();
        self.directory.search(query).await
    }

    /// Reset to the idle screen: clear the member and context, then refresh
    /// settings so the next session starts on current configuration.
    ///
    /// This refresh covers the common case of configuration drifting between
    /// sessions. Kiosks that sit idle for long stretches can additionally
    /// drive [`refresh_settings`](Self::refresh_settings) on a timer from the
    /// embedding layer.
    pub async fn return_to_idle(&mut self) {
        info!(from = %self.screen, "returning to idle");
        self.screen = Screen::Idle;
        self.member = None;
        self.context.clear();
        self.refresh_settings().await;
    }

    /// Handle a tag scanned at the kiosk itself.
    ///
    /// Only honored on the idle screen; a scan mid-session would clobber the
    /// session in progress. Unknown tags and directory outages leave the
    /// kiosk exactly where it was.
    pub async fn on_device_scan(&mut self, uid: ScanUid) {
        if !self.screen.is_idle() {
            debug!(%uid, screen = %self.screen, "ignoring scan outside idle");
            return;
        }

        match self.directory.lookup_by_uid(&uid).await {
            Ok(Some(snapshot)) => {
                info!(%uid, member_id = %snapshot.member_id, "scan identified member");
                self.member = Some(snapshot);
                self.transition(Screen::Member, None);
            }
            Ok(None) => info!(%uid, "scan matched no member, ignoring"),
            Err(err) => warn!(%uid, %err, "member lookup failed, ignoring scan"),
        }
    }

    /// Re-fetch settings from the source, keeping the current ones on failure.
    ///
    /// Called on bootstrap and on every return-to-idle; also available to the
    /// embedding layer for a periodic refresh while the idle screen is up.
    pub async fn refresh_settings(&mut self) {
        match self.settings_source.fetch().await {
            Ok(settings) => {
                debug!(pool = %settings.pool_name, "settings refreshed");
                self.settings = settings;
            }
            Err(err) => warn!(%err, "settings fetch failed, keeping previous settings"),
        }
    }
}
