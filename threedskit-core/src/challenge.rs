//! Challenge orchestration: drives the device engine's interactive
//! challenge to exactly one terminal event, releases the device transaction
//! exactly once, and collapses every terminal path into a
//! [`ChallengeOutcome`].

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::{
    authentication::AuthenticationDecision,
    device::{
        run_blocking, AuthenticationRequestParameters, ChallengeParameters,
        ChallengeStatusReceiver, DeviceTransaction,
    },
    error::ThreeDsError,
    outcome::{ChallengeOutcome, ChallengeStatus},
};

/// Challenge timeout handed to the device engine, in minutes. The backend
/// session record advertises the same value as `sdk_max_timeout`.
pub(crate) const CHALLENGE_TIMEOUT_MINUTES: u32 = 5;

/// Base of the requestor app callback URL; the device SDK transaction id is
/// appended per transaction.
const REQUESTOR_APP_URL: &str = "https://www.ravelin.com/";

/// Output of the session phase consumed by the challenge phase: the open
/// device transaction and the parameters it was bound with.
#[derive(Clone)]
pub(crate) struct DeviceSession {
    pub(crate) transaction: Arc<TransactionGuard>,
    pub(crate) parameters: AuthenticationRequestParameters,
}

/// Single-owner wrapper around a device transaction serializing closure:
/// concurrent or repeated close attempts produce exactly one underlying
/// close effect, and a closed transaction is never reused.
pub(crate) struct TransactionGuard {
    transaction: Arc<dyn DeviceTransaction>,
    closed: Mutex<bool>,
}

impl TransactionGuard {
    pub(crate) fn new(transaction: Arc<dyn DeviceTransaction>) -> Self {
        Self {
            transaction,
            closed: Mutex::new(false),
        }
    }

    fn transaction(&self) -> Arc<dyn DeviceTransaction> {
        Arc::clone(&self.transaction)
    }

    /// Closes the underlying transaction. Only the first call reaches the
    /// engine; a close failure is fatal, not retryable.
    pub(crate) fn close(&self) -> Result<(), ThreeDsError> {
        let mut closed = self
            .closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return Ok(());
        }
        *closed = true;

        self.transaction
            .close()
            .map_err(|err| ThreeDsError::TransactionClose {
                detail: err.to_string(),
            })
    }
}

/// Terminal event delivered by the device engine's challenge callback.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChallengeEvent {
    Completed { transaction_status: String },
    Cancelled,
    TimedOut,
    ProtocolError { message: String },
    RuntimeError { message: String },
}

/// Resolves the challenge's one-shot channel with the first terminal event;
/// later events are dropped.
struct EventRelay {
    sender: Mutex<Option<oneshot::Sender<ChallengeEvent>>>,
}

impl EventRelay {
    fn channel() -> (Arc<Self>, oneshot::Receiver<ChallengeEvent>) {
        let (sender, receiver) = oneshot::channel();
        let relay = Arc::new(Self {
            sender: Mutex::new(Some(sender)),
        });
        (relay, receiver)
    }

    fn resolve(&self, event: ChallengeEvent) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            // The receiver only disappears when the caller abandoned the
            // whole flow; nothing left to notify then.
            Some(sender) => drop(sender.send(event)),
            None => {
                log::debug!("ignoring challenge event after terminal delivery: {event:?}");
            }
        }
    }
}

impl ChallengeStatusReceiver for EventRelay {
    fn completed(&self, transaction_status: String) {
        self.resolve(ChallengeEvent::Completed { transaction_status });
    }

    fn cancelled(&self) {
        self.resolve(ChallengeEvent::Cancelled);
    }

    fn timed_out(&self) {
        self.resolve(ChallengeEvent::TimedOut);
    }

    fn protocol_error(&self, message: String) {
        self.resolve(ChallengeEvent::ProtocolError { message });
    }

    fn runtime_error(&self, message: String) {
        self.resolve(ChallengeEvent::RuntimeError { message });
    }
}

/// Drives one challenge for one decision to a terminal outcome.
pub(crate) struct ChallengeOrchestrator {
    session: DeviceSession,
}

impl ChallengeOrchestrator {
    pub(crate) fn new(session: DeviceSession) -> Self {
        Self { session }
    }

    /// Runs the challenge to its terminal outcome.
    ///
    /// The transaction is released before any outcome or error leaves this
    /// function. Challenge-construction failures never escape as errors:
    /// the caller receives an outcome built from the pre-challenge decision
    /// with the failure as reason. Only engine-internal defects (close
    /// failure, unmapped status letter, a missing terminal event) propagate.
    pub(crate) async fn run(
        &self,
        session_id: &str,
        decision: &AuthenticationDecision,
    ) -> Result<ChallengeOutcome, ThreeDsError> {
        let receiver = match self.begin(session_id, decision).await {
            Ok(receiver) => receiver,
            Err(err) => {
                log::error!(
                    "challenge could not be started for session {session_id}: {err}"
                );
                self.close_transaction().await?;
                return Ok(ChallengeOutcome::from_decision(
                    session_id,
                    decision,
                    Some(err.to_string()),
                ));
            }
        };

        let event = receiver.await;

        // Terminal: release the transaction before delivering anything.
        self.close_transaction().await?;

        let event = event.map_err(|_| ThreeDsError::ContractViolation {
            detail: "challenge ended without a terminal event".to_owned(),
        })?;

        Self::outcome_from_event(session_id, decision, event)
    }

    /// Builds the challenge parameters and hands them to the device engine.
    async fn begin(
        &self,
        session_id: &str,
        decision: &AuthenticationDecision,
    ) -> Result<oneshot::Receiver<ChallengeEvent>, ThreeDsError> {
        let parameters = self.challenge_parameters(session_id, decision);
        let (relay, receiver) = EventRelay::channel();

        let transaction = self.session.transaction.transaction();
        let status_receiver: Arc<dyn ChallengeStatusReceiver> = relay;
        run_blocking(move || {
            transaction.do_challenge(
                parameters,
                CHALLENGE_TIMEOUT_MINUTES,
                status_receiver,
            )
        })
        .await?;

        Ok(receiver)
    }

    fn challenge_parameters(
        &self,
        session_id: &str,
        decision: &AuthenticationDecision,
    ) -> ChallengeParameters {
        ChallengeParameters {
            three_ds_server_transaction_id: session_id.to_owned(),
            acs_reference_number: decision.acs_reference_number.clone(),
            acs_signed_content: decision.acs_signed_content.clone(),
            acs_transaction_id: decision.acs_transaction_id.clone(),
            requestor_app_url: format!(
                "{REQUESTOR_APP_URL}?transID={}",
                self.session.parameters.sdk_transaction_id
            ),
            merchant_name: decision.merchant_name.clone(),
            purchase_currency: decision.currency.clone(),
            purchase_amount: decision.purchase_amount.clone(),
        }
    }

    async fn close_transaction(&self) -> Result<(), ThreeDsError> {
        let guard = Arc::clone(&self.session.transaction);
        run_blocking(move || guard.close()).await
    }

    fn outcome_from_event(
        session_id: &str,
        decision: &AuthenticationDecision,
        event: ChallengeEvent,
    ) -> Result<ChallengeOutcome, ThreeDsError> {
        let (status, reason) = match event {
            ChallengeEvent::Completed { transaction_status } => (
                ChallengeStatus::from_transaction_status(&transaction_status)?,
                decision.authentication_status_reason.clone(),
            ),
            ChallengeEvent::Cancelled => (
                ChallengeStatus::Failed,
                Some("Challenge cancelled".to_owned()),
            ),
            ChallengeEvent::TimedOut => (
                ChallengeStatus::Failed,
                Some("Challenge timed out".to_owned()),
            ),
            ChallengeEvent::ProtocolError { message } => (
                ChallengeStatus::Failed,
                Some(format!("ProtocolError {message}")),
            ),
            ChallengeEvent::RuntimeError { message } => (
                ChallengeStatus::Failed,
                Some(format!("RuntimeError {message}")),
            ),
        };

        Ok(ChallengeOutcome {
            session_id: session_id.to_owned(),
            status,
            reason,
        })
    }
}
