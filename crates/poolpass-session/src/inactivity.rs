//! Inactivity supervisor.
//!
//! Watches the activity bus and walks an abandoned kiosk back to the idle
//! screen: a quiet timeout arms a visible warning countdown, and an expired
//! countdown forces idle. The supervisor owns both timers; nothing else in
//! the runtime measures idleness.
//!
//! During the warning phase activity signals are deliberately not observed:
//! only an explicit presence confirmation dismisses the countdown. The
//! armed-phase listener is dropped on entry to the warning and a fresh one
//! is subscribed on re-arm, so signals sent while the warning was up can
//! never leak into the next armed phase.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use poolpass_core::{ActivityBus, Error, KioskSettings, Result};
use poolpass_core::constants::{
    DEFAULT_INACTIVITY_TIMEOUT_SECS, DEFAULT_INACTIVITY_WARNING_SECS, WARNING_TICK,
};

/// Phase of the inactivity supervisor, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePhase {
    /// Supervision suspended; no timers running.
    Disabled,

    /// Counting quiet time; any activity signal restarts the count.
    Armed,

    /// Warning overlay with a live countdown; only an explicit presence
    /// confirmation dismisses it.
    Warning {
        /// Seconds left before the forced return to idle.
        remaining_secs: u64,
    },
}

/// Supervisor timing.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Quiet time before the warning appears.
    pub timeout: Duration,

    /// Length of the warning countdown in seconds.
    pub warning_secs: u64,
}

impl SupervisorConfig {
    /// Timing taken from fetched kiosk settings.
    pub fn from_settings(settings: &KioskSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.inactivity_timeout_seconds),
            warning_secs: settings.inactivity_warning_seconds,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_INACTIVITY_TIMEOUT_SECS),
            warning_secs: DEFAULT_INACTIVITY_WARNING_SECS,
        }
    }
}

enum Command {
    Confirm,
    SetEnabled(bool),
    Reconfigure(SupervisorConfig),
}

/// Handle to the running supervisor task.
///
/// # Examples
///
/// ```no_run
/// use poolpass_core::ActivityBus;
/// use poolpass_session::{InactivitySupervisor, SupervisorConfig};
///
/// # async fn example(bus: ActivityBus) {
/// let supervisor = InactivitySupervisor::spawn(bus, SupervisorConfig::default(), || {
///     println!("kiosk abandoned, returning to idle");
/// });
///
/// // "I'm still here" on the warning overlay:
/// supervisor.confirm_presence();
/// # }
/// ```
pub struct InactivitySupervisor {
    phase_rx: watch::Receiver<IdlePhase>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl InactivitySupervisor {
    /// Spawn the supervisor, armed immediately.
    ///
    /// `on_forced_idle` runs on the supervisor task, exactly once per expired
    /// warning, before the supervisor re-arms. Keep it cheap: hand off to a
    /// channel rather than doing real work inline.
    pub fn spawn(
        bus: ActivityBus,
        config: SupervisorConfig,
        on_forced_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let (phase_tx, phase_rx) = watch::channel(IdlePhase::Armed);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_supervisor(
            bus,
            config,
            phase_tx,
            cmd_rx,
            cancel.clone(),
            Arc::new(on_forced_idle),
        ));

        Self {
            phase_rx,
            cmd_tx,
            cancel,
            task: Some(task),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> IdlePhase {
        *self.phase_rx.borrow()
    }

    /// Watch phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<IdlePhase> {
        self.phase_rx.clone()
    }

    /// Explicit "I'm still here".
    ///
    /// Dismisses the warning and re-arms, or restarts the armed count. This
    /// is the only input honored during the warning phase.
    pub fn confirm_presence(&self) {
        let _ = self.cmd_tx.send(Command::Confirm);
    }

    /// Suspend or resume supervision.
    ///
    /// Screens that legitimately sit quiet for minutes (a terminal payment
    /// waiting on a slow card) disable the supervisor rather than faking
    /// activity.
    pub fn set_enabled(&self, enabled: bool) {
        let _ = self.cmd_tx.send(Command::SetEnabled(enabled));
    }

    /// Apply new timing; the supervisor re-arms from scratch.
    pub fn reconfigure(&self, config: SupervisorConfig) {
        let _ = self.cmd_tx.send(Command::Reconfigure(config));
    }

    /// Stop supervision for good.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShutDown` if the supervisor task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task.await.map_err(|err| Error::ShutDown(err.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for InactivitySupervisor {
    fn drop(&mut self) {
        // A dropped handle must not leave the timers running.
        self.cancel.cancel();
    }
}

async fn run_supervisor(
    bus: ActivityBus,
    mut config: SupervisorConfig,
    phase_tx: watch::Sender<IdlePhase>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
    on_forced_idle: Arc<dyn Fn() + Send + Sync>,
) {
    let mut enabled = true;

    'cycle: loop {
        if !enabled {
            phase_tx.send_replace(IdlePhase::Disabled);
            debug!("inactivity supervision disabled");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    cmd = commands.recv() => match cmd {
                        None => return,
                        Some(Command::SetEnabled(true)) => {
                            enabled = true;
                            continue 'cycle;
                        }
                        Some(Command::Reconfigure(next)) => config = next,
                        Some(Command::SetEnabled(false)) | Some(Command::Confirm) => {}
                    },
                }
            }
        }

        // Fresh listener per arming: signals sent before this point (for
        // instance during a just-expired warning) are invisible here.
        let mut listener = bus.subscribe();
        let mut bus_alive = true;
        phase_tx.send_replace(IdlePhase::Armed);
        debug!(timeout_secs = config.timeout.as_secs(), "armed");

        let deadline = sleep(config.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                cmd = commands.recv() => match cmd {
                    None => return,
                    Some(Command::Confirm) => {
                        deadline.as_mut().reset(Instant::now() + config.timeout);
                    }
                    Some(Command::SetEnabled(false)) => {
                        enabled = false;
                        continue 'cycle;
                    }
                    Some(Command::SetEnabled(true)) => {}
                    Some(Command::Reconfigure(next)) => {
                        config = next;
                        continue 'cycle;
                    }
                },
                active = listener.next(), if bus_alive => {
                    if active {
                        deadline.as_mut().reset(Instant::now() + config.timeout);
                    } else {
                        // Bus gone; the count runs out on schedule.
                        bus_alive = false;
                    }
                }
                _ = &mut deadline => break,
            }
        }

        // Warning phase: the armed listener is dropped, so activity signals
        // have no effect until the next arming.
        drop(listener);
        let mut remaining = config.warning_secs;

        loop {
            if remaining == 0 {
                info!("inactivity warning expired, forcing return to idle");
                on_forced_idle();
                continue 'cycle;
            }
            phase_tx.send_replace(IdlePhase::Warning {
                remaining_secs: remaining,
            });

            tokio::select! {
                _ = cancel.cancelled() => return,
                cmd = commands.recv() => match cmd {
                    None => return,
                    Some(Command::Confirm) => {
                        debug!("presence confirmed, dismissing warning");
                        continue 'cycle;
                    }
                    Some(Command::SetEnabled(false)) => {
                        enabled = false;
                        continue 'cycle;
                    }
                    Some(Command::SetEnabled(true)) => {}
                    Some(Command::Reconfigure(next)) => {
                        config = next;
                        continue 'cycle;
                    }
                },
                _ = sleep(WARNING_TICK) => remaining -= 1,
            }
        }
    }
}
