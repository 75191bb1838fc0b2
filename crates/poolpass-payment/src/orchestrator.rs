//! Terminal-payment orchestrator.
//!
//! One payment attempt is one background task: initiate, then poll at a
//! fixed cadence until the backend reports a terminal verdict or the attempt
//! cap runs out. The task owns all timing; the handle observes phase changes
//! on a watch channel and can cancel or retry.
//!
//! Once a terminal phase is published the task exits and nothing mutates the
//! phase again, with one exception: [`TerminalPayment::retry`] starts a
//! fresh attempt from `failed`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use poolpass_core::CorrelationKey;
use poolpass_core::constants::{MAX_POLL_ATTEMPTS, POLL_INTERVAL};

use crate::gateway::{CardSummary, InitiateOutcome, InitiateRequest, PaymentGateway, PollOutcome};

/// Phase of one terminal-payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPhase {
    /// Initiation call in flight; the terminal is not prompting yet.
    Initiating,

    /// Terminal is prompting for a card; status polls are running.
    Waiting,

    /// Reserved for backends that report an explicit capture stage. The
    /// orchestrator never enters it today.
    Processing,

    /// Payment approved.
    Success {
        /// Card details for the receipt.
        card: CardSummary,
    },

    /// Payment declined, errored, or timed out.
    Failed {
        /// Reason shown on the kiosk.
        reason: String,
    },

    /// Cancelled from the kiosk side.
    Cancelled,
}

impl PaymentPhase {
    /// Whether this phase ends the attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }
}

/// Timing knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Delay between consecutive status polls.
    pub poll_interval: Duration,

    /// Polls issued before the attempt fails with a timeout.
    pub max_poll_attempts: u32,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

/// Handle to one terminal-payment attempt.
///
/// # Examples
///
/// ```no_run
/// use poolpass_payment::{InitiateRequest, PaymentGateway, TerminalPayment};
///
/// # async fn example<G: PaymentGateway + 'static>(gateway: G, request: InitiateRequest) {
/// let payment = TerminalPayment::start(gateway, request);
/// let mut phase = payment.watch_phase();
///
/// while !phase.borrow_and_update().is_terminal() {
///     phase.changed().await.ok();
/// }
/// # }
/// ```
pub struct TerminalPayment<G> {
    gateway: Arc<G>,
    request: InitiateRequest,
    config: PaymentConfig,
    phase_tx: Arc<watch::Sender<PaymentPhase>>,
    phase_rx: watch::Receiver<PaymentPhase>,
    key: Arc<Mutex<Option<CorrelationKey>>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<G> TerminalPayment<G>
where
    G: PaymentGateway + 'static,
{
    /// Start a payment attempt with the standard poll cadence.
    pub fn start(gateway: G, request: InitiateRequest) -> Self {
        Self::start_with_config(gateway, request, PaymentConfig::default())
    }

    /// Start a payment attempt with explicit timing.
    pub fn start_with_config(gateway: G, request: InitiateRequest, config: PaymentConfig) -> Self {
        let (phase_tx, phase_rx) = watch::channel(PaymentPhase::Initiating);
        let phase_tx = Arc::new(phase_tx);

        let mut payment = Self {
            gateway: Arc::new(gateway),
            request,
            config,
            phase_tx,
            phase_rx,
            key: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
            task: None,
        };
        payment.spawn_attempt();
        payment
    }

    fn spawn_attempt(&mut self) {
        debug!(member_id = %self.request.member_id, "starting terminal payment attempt");
        self.task = Some(tokio::spawn(run_attempt(
            Arc::clone(&self.gateway),
            self.request.clone(),
            self.config.clone(),
            Arc::clone(&self.phase_tx),
            Arc::clone(&self.key),
            self.cancel.clone(),
        )));
    }

    /// Current phase.
    pub fn phase(&self) -> PaymentPhase {
        self.phase_rx.borrow().clone()
    }

    /// Watch phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<PaymentPhase> {
        self.phase_rx.clone()
    }

    /// Cancel the attempt from the kiosk side.
    ///
    /// Stops the polling loop, publishes `cancelled`, and tells the backend
    /// to release the terminal. The backend call is best effort; a failure
    /// there is logged and swallowed because the kiosk-side attempt is
    /// already over.
    ///
    /// If the attempt already reached a terminal phase this does nothing:
    /// a completed payment stays completed.
    pub async fn cancel(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }

        if self.phase().is_terminal() {
            debug!("cancel after terminal phase, ignoring");
            return;
        }

        info!("terminal payment cancelled from kiosk");
        self.phase_tx.send_replace(PaymentPhase::Cancelled);

        let key = self.key.lock().ok().and_then(|slot| slot.clone());
        if let Some(key) = key
            && let Err(err) = self.gateway.cancel(&key).await
        {
            warn!(%err, "backend cancel failed, terminal will time out on its own");
        }
    }

    /// Start a fresh attempt after a failure.
    ///
    /// Only meaningful from `failed`; from any other phase this is a logged
    /// no-op. The new attempt initiates from scratch and gets its own
    /// correlation key.
    pub fn retry(&mut self) {
        if !matches!(self.phase(), PaymentPhase::Failed { .. }) {
            warn!(phase = ?self.phase(), "retry outside failed phase, ignoring");
            return;
        }

        info!("retrying terminal payment");
        if let Ok(mut slot) = self.key.lock() {
            *slot = None;
        }
        self.cancel = CancellationToken::new();
        self.phase_tx.send_replace(PaymentPhase::Initiating);
        self.spawn_attempt();
    }
}

impl<G> Drop for TerminalPayment<G> {
    fn drop(&mut self) {
        // A dropped handle must not leave a polling loop running.
        self.cancel.cancel();
    }
}

/// One full attempt: initiate, then poll until a verdict or the cap.
async fn run_attempt<G: PaymentGateway>(
    gateway: Arc<G>,
    request: InitiateRequest,
    config: PaymentConfig,
    phase_tx: Arc<watch::Sender<PaymentPhase>>,
    key_slot: Arc<Mutex<Option<CorrelationKey>>>,
    cancel: CancellationToken,
) {
    let initiated = tokio::select! {
        _ = cancel.cancelled() => return,
        result = gateway.initiate(request) => result,
    };

    let key = match initiated {
        Ok(InitiateOutcome::Accepted { key }) => key,
        Ok(InitiateOutcome::Rejected { reason }) => {
            warn!(%reason, "payment initiation rejected");
            phase_tx.send_replace(PaymentPhase::Failed { reason });
            return;
        }
        Err(err) => {
            warn!(%err, "payment initiation failed");
            phase_tx.send_replace(PaymentPhase::Failed {
                reason: "Could not reach the payment service".to_string(),
            });
            return;
        }
    };

    debug!(%key, "payment initiated, polling");
    if let Ok(mut slot) = key_slot.lock() {
        *slot = Some(key.clone());
    }
    phase_tx.send_replace(PaymentPhase::Waiting);

    let mut attempt: u32 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
        attempt += 1;

        let polled = tokio::select! {
            _ = cancel.cancelled() => return,
            result = gateway.poll(&key) => result,
        };

        match polled {
            Ok(PollOutcome::Pending) => {}
            Ok(PollOutcome::Approved { card }) => {
                info!(%key, "payment approved");
                phase_tx.send_replace(PaymentPhase::Success { card });
                return;
            }
            Ok(PollOutcome::Declined { reason }) => {
                info!(%key, %reason, "payment declined");
                phase_tx.send_replace(PaymentPhase::Failed { reason });
                return;
            }
            Ok(PollOutcome::Failed { reason }) => {
                warn!(%key, %reason, "terminal reported failure");
                phase_tx.send_replace(PaymentPhase::Failed { reason });
                return;
            }
            // Transient transport faults still burn an attempt so a dead
            // backend cannot keep the kiosk waiting forever.
            Err(err) => warn!(%key, %err, attempt, "status poll failed, will retry"),
        }

        if attempt > config.max_poll_attempts {
            warn!(%key, attempt, "payment timed out");
            phase_tx.send_replace(PaymentPhase::Failed {
                reason: "Payment timed out".to_string(),
            });
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::{Duration, timeout};

    use poolpass_core::MemberId;

    use super::*;
    use crate::gateway::{GatewayError, GatewayResult};

    const TICK: Duration = Duration::from_millis(1500);

    fn request() -> InitiateRequest {
        InitiateRequest {
            member_id: MemberId::new(7).unwrap(),
            plan_id: 3,
            pin: None,
            save_card: false,
            use_credit: false,
        }
    }

    #[derive(Default)]
    struct MockState {
        initiate_script: VecDeque<GatewayResult<InitiateOutcome>>,
        poll_script: VecDeque<GatewayResult<PollOutcome>>,
    }

    /// Scripted gateway: pops queued answers, defaulting to accept and
    /// pending once the scripts run dry.
    #[derive(Clone, Default)]
    struct MockGateway {
        state: Arc<Mutex<MockState>>,
        polls: Arc<AtomicU32>,
        cancels: Arc<AtomicU32>,
    }

    impl MockGateway {
        fn script_initiate(&self, outcome: GatewayResult<InitiateOutcome>) {
            self.state.lock().unwrap().initiate_script.push_back(outcome);
        }

        fn script_poll(&self, outcome: GatewayResult<PollOutcome>) {
            self.state.lock().unwrap().poll_script.push_back(outcome);
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }

        fn cancels(&self) -> u32 {
            self.cancels.load(Ordering::SeqCst)
        }
    }

    impl PaymentGateway for MockGateway {
        async fn initiate(&self, _request: InitiateRequest) -> GatewayResult<InitiateOutcome> {
            self.state
                .lock()
                .unwrap()
                .initiate_script
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(InitiateOutcome::Accepted {
                        key: CorrelationKey::new("pi_test"),
                    })
                })
        }

        async fn poll(&self, _key: &CorrelationKey) -> GatewayResult<PollOutcome> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.state
                .lock()
                .unwrap()
                .poll_script
                .pop_front()
                .unwrap_or(Ok(PollOutcome::Pending))
        }

        async fn cancel(&self, _key: &CorrelationKey) -> GatewayResult<()> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_for_terminal<G: PaymentGateway + 'static>(
        payment: &TerminalPayment<G>,
    ) -> PaymentPhase {
        let mut phase = payment.watch_phase();
        timeout(Duration::from_secs(600), async {
            while !phase.borrow_and_update().is_terminal() {
                phase.changed().await.unwrap();
            }
        })
        .await
        .expect("payment never reached a terminal phase");
        payment.phase()
    }

    #[tokio::test(start_paused = true)]
    async fn approval_after_a_few_polls_is_success() {
        let gateway = MockGateway::default();
        gateway.script_poll(Ok(PollOutcome::Pending));
        gateway.script_poll(Ok(PollOutcome::Pending));
        gateway.script_poll(Ok(PollOutcome::Approved {
            card: CardSummary {
                last4: Some("4242".to_string()),
                brand: Some("visa".to_string()),
            },
        }));

        let payment = TerminalPayment::start(gateway.clone(), request());
        let phase = wait_for_terminal(&payment).await;

        match phase {
            PaymentPhase::Success { card } => {
                assert_eq!(card.last4.as_deref(), Some("4242"));
                assert_eq!(card.brand.as_deref(), Some("visa"));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(gateway.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn decline_carries_the_backend_reason() {
        let gateway = MockGateway::default();
        gateway.script_poll(Ok(PollOutcome::Declined {
            reason: "Insufficient funds".to_string(),
        }));

        let payment = TerminalPayment::start(gateway.clone(), request());
        let phase = wait_for_terminal(&payment).await;

        assert_eq!(
            phase,
            PaymentPhase::Failed {
                reason: "Insufficient funds".to_string()
            }
        );
        assert_eq!(gateway.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_initiation_fails_without_polling() {
        let gateway = MockGateway::default();
        gateway.script_initiate(Ok(InitiateOutcome::Rejected {
            reason: "Membership frozen".to_string(),
        }));

        let payment = TerminalPayment::start(gateway.clone(), request());
        let phase = wait_for_terminal(&payment).await;

        assert_eq!(
            phase,
            PaymentPhase::Failed {
                reason: "Membership frozen".to_string()
            }
        );
        assert_eq!(gateway.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn initiation_transport_fault_fails_the_attempt() {
        let gateway = MockGateway::default();
        gateway.script_initiate(Err(GatewayError::Transport("connection refused".to_string())));

        let payment = TerminalPayment::start(gateway.clone(), request());
        let phase = wait_for_terminal(&payment).await;

        assert!(matches!(phase, PaymentPhase::Failed { .. }));
        assert_eq!(gateway.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_poll_cap_times_out() {
        let gateway = MockGateway::default();
        let payment = TerminalPayment::start(gateway.clone(), request());

        let phase = wait_for_terminal(&payment).await;
        assert_eq!(
            phase,
            PaymentPhase::Failed {
                reason: "Payment timed out".to_string()
            }
        );
        // The attempt that exceeds the cap still ran; none follow it.
        assert_eq!(gateway.polls(), MAX_POLL_ATTEMPTS + 1);

        tokio::time::sleep(TICK * 4).await;
        assert_eq!(gateway.polls(), MAX_POLL_ATTEMPTS + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_faults_burn_attempts_but_do_not_terminate() {
        let gateway = MockGateway::default();
        gateway.script_poll(Err(GatewayError::Transport("timeout".to_string())));
        gateway.script_poll(Err(GatewayError::Transport("timeout".to_string())));
        gateway.script_poll(Ok(PollOutcome::Approved {
            card: CardSummary::default(),
        }));

        let payment = TerminalPayment::start(gateway.clone(), request());
        let phase = wait_for_terminal(&payment).await;

        assert!(matches!(phase, PaymentPhase::Success { .. }));
        assert_eq!(gateway.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_waiting_stops_polling_and_notifies_backend() {
        let gateway = MockGateway::default();
        let mut payment = TerminalPayment::start(gateway.clone(), request());

        // Let a couple of polls happen.
        let mut phase = payment.watch_phase();
        timeout(Duration::from_secs(60), async {
            while *phase.borrow_and_update() != PaymentPhase::Waiting {
                phase.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(TICK * 2).await;

        payment.cancel().await;
        assert_eq!(payment.phase(), PaymentPhase::Cancelled);
        assert_eq!(gateway.cancels(), 1);

        let polls_at_cancel = gateway.polls();
        tokio::time::sleep(TICK * 4).await;
        assert_eq!(gateway.polls(), polls_at_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_success_changes_nothing() {
        let gateway = MockGateway::default();
        gateway.script_poll(Ok(PollOutcome::Approved {
            card: CardSummary::default(),
        }));

        let mut payment = TerminalPayment::start(gateway.clone(), request());
        wait_for_terminal(&payment).await;

        payment.cancel().await;
        assert!(matches!(payment.phase(), PaymentPhase::Success { .. }));
        assert_eq!(gateway.cancels(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_from_failed_runs_a_fresh_attempt() {
        let gateway = MockGateway::default();
        gateway.script_initiate(Ok(InitiateOutcome::Rejected {
            reason: "Terminal busy".to_string(),
        }));
        gateway.script_poll(Ok(PollOutcome::Approved {
            card: CardSummary::default(),
        }));

        let mut payment = TerminalPayment::start(gateway.clone(), request());
        let phase = wait_for_terminal(&payment).await;
        assert!(matches!(phase, PaymentPhase::Failed { .. }));

        payment.retry();
        let phase = wait_for_terminal(&payment).await;
        assert!(matches!(phase, PaymentPhase::Success { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_outside_failed_is_a_no_op() {
        let gateway = MockGateway::default();
        gateway.script_poll(Ok(PollOutcome::Approved {
            card: CardSummary::default(),
        }));

        let mut payment = TerminalPayment::start(gateway.clone(), request());
        wait_for_terminal(&payment).await;
        let polls_before = gateway.polls();

        payment.retry();
        tokio::time::sleep(TICK * 3).await;

        assert!(matches!(payment.phase(), PaymentPhase::Success { .. }));
        assert_eq!(gateway.polls(), polls_before);
    }
}
