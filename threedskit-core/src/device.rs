//! Contract between the engine and the host-provided on-device 3DS SDK.
//!
//! The device engine performs the cryptographic and UI work of the EMVCo
//! 3DS2 protocol (key generation, device fingerprinting, challenge
//! rendering). The host application implements these traits over its
//! platform SDK and hands them to [`crate::ThreeDsService`]; the engine only
//! ever talks to the device through this narrow surface.

use std::sync::Arc;

use crate::error::{DeviceEngineError, ThreeDsError};

/// Configuration handed to the device engine at initialization.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EngineConfig {
    /// Provider environment identifier, e.g. `EuLive`.
    pub region: String,
    /// `Bearer` token retrieved from the provider key CDN.
    pub api_token: String,
    /// BCP-47 locale for challenge rendering. When absent the engine applies
    /// the device locale.
    pub locale: Option<String>,
}

/// Per-transaction cryptographic parameters generated by the device engine.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AuthenticationRequestParameters {
    /// Device SDK transaction identifier.
    pub sdk_transaction_id: String,
    /// Device SDK application identifier.
    pub sdk_app_id: String,
    /// Reference number assigned to the device SDK by EMVCo.
    pub sdk_reference_number: String,
    /// Ephemeral public key bound to this transaction.
    pub sdk_ephemeral_public_key: String,
    /// Encrypted device fingerprint data.
    pub device_data: String,
    /// Protocol message version the device SDK selected, when reported.
    pub message_version: Option<String>,
}

/// Parameters driving an interactive challenge.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ChallengeParameters {
    /// 3DS server transaction identifier (the session id).
    pub three_ds_server_transaction_id: String,
    /// ACS reference number from the authentication decision.
    pub acs_reference_number: String,
    /// ACS signed content (JWS) from the authentication decision.
    pub acs_signed_content: Option<String>,
    /// ACS transaction identifier from the authentication decision.
    pub acs_transaction_id: String,
    /// Requestor app callback URL embedding the device SDK transaction id.
    pub requestor_app_url: String,
    /// Merchant display name.
    pub merchant_name: String,
    /// Purchase currency code.
    pub purchase_currency: Option<String>,
    /// Purchase amount in minor units.
    pub purchase_amount: String,
}

/// Severity reported for a device integrity warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum WarningSeverity {
    /// Informational.
    Low,
    /// Should be reviewed before continuing.
    Medium,
    /// The device cannot be trusted.
    High,
}

/// Device integrity warning raised by the engine's security checks.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SecurityWarning {
    /// Warning code, e.g. `SW01`.
    pub id: String,
    /// Human-readable warning message.
    pub message: String,
    /// Reported severity.
    pub severity: WarningSeverity,
}

/// Warning codes surfaced to callers; everything else is ignorable.
///
/// SW01 jailbroken device, SW02 SDK integrity tampered, SW03 emulator,
/// SW04 debugger attached, SW05 unsupported OS version.
const KNOWN_WARNING_IDS: [&str; 5] = ["SW01", "SW02", "SW03", "SW04", "SW05"];

pub(crate) fn filter_warnings(warnings: Vec<SecurityWarning>) -> Vec<SecurityWarning> {
    warnings
        .into_iter()
        .filter(|warning| KNOWN_WARNING_IDS.contains(&warning.id.as_str()))
        .collect()
}

/// Host-implemented handle to the on-device 3DS engine.
#[uniffi::export(with_foreign)]
pub trait DeviceEngine: Send + Sync {
    /// One-time engine setup. Must complete before any other call.
    fn initialize(&self, config: EngineConfig) -> Result<(), DeviceEngineError>;

    /// Runs the engine's device integrity checks.
    ///
    /// # Errors
    /// Returns an error when the engine cannot evaluate the device.
    fn warnings(&self) -> Result<Vec<SecurityWarning>, DeviceEngineError>;

    /// Creates a device transaction for the given directory server and
    /// protocol version.
    ///
    /// # Errors
    /// Returns an error when the engine cannot start a transaction, e.g.
    /// because the directory server is unknown to it.
    fn create_transaction(
        &self,
        directory_server_id: String,
        message_version: String,
    ) -> Result<Arc<dyn DeviceTransaction>, DeviceEngineError>;
}

/// A single device transaction. Single-owner; closed exactly once by the
/// engine after the challenge (or its short-circuit) reaches a terminal
/// state.
#[uniffi::export(with_foreign)]
pub trait DeviceTransaction: Send + Sync {
    /// Ephemeral cryptographic parameters for this transaction. `None` when
    /// the underlying SDK produced no parameters, which the engine treats as
    /// a contract violation.
    ///
    /// # Errors
    /// Returns an error when the engine cannot read the parameters.
    fn authentication_request_parameters(
        &self,
    ) -> Result<Option<AuthenticationRequestParameters>, DeviceEngineError>;

    /// Starts the interactive challenge on the host UI. Asynchronous:
    /// exactly one terminal [`ChallengeStatusReceiver`] event fires later,
    /// driven by the cardholder, the ACS, or the engine's own timeout.
    ///
    /// # Errors
    /// Returns an error when the challenge cannot be started at all.
    fn do_challenge(
        &self,
        parameters: ChallengeParameters,
        timeout_minutes: u32,
        receiver: Arc<dyn ChallengeStatusReceiver>,
    ) -> Result<(), DeviceEngineError>;

    /// Releases the transaction and its UI resources.
    ///
    /// # Errors
    /// Returns an error when the underlying SDK fails to release; the engine
    /// treats this as fatal.
    fn close(&self) -> Result<(), DeviceEngineError>;
}

/// Receiver for the terminal events of a challenge. Implemented by the
/// engine and invoked exactly once by the device SDK.
#[uniffi::export(with_foreign)]
pub trait ChallengeStatusReceiver: Send + Sync {
    /// The challenge flow completed; `transaction_status` carries the
    /// single-letter EMVCo transaction status.
    fn completed(&self, transaction_status: String);

    /// The cardholder cancelled the challenge.
    fn cancelled(&self);

    /// The challenge timed out in the device SDK.
    fn timed_out(&self);

    /// The ACS or SDK detected a 3DS protocol error.
    fn protocol_error(&self, message: String);

    /// The device SDK hit an internal error.
    fn runtime_error(&self, message: String);
}

/// Async adapter over a host [`DeviceEngine`]. All engine calls are
/// blocking, so each one is dispatched to the blocking pool instead of
/// running on the caller's thread.
pub(crate) struct EngineAdapter {
    engine: Arc<dyn DeviceEngine>,
}

impl EngineAdapter {
    pub(crate) fn new(engine: Arc<dyn DeviceEngine>) -> Self {
        Self { engine }
    }

    pub(crate) async fn initialize(
        &self,
        config: EngineConfig,
    ) -> Result<(), ThreeDsError> {
        let engine = Arc::clone(&self.engine);
        run_blocking(move || engine.initialize(config)).await
    }

    /// Runs the engine security checks and filters the result down to the
    /// well-known warning codes.
    pub(crate) async fn security_warnings(
        &self,
    ) -> Result<Vec<SecurityWarning>, ThreeDsError> {
        let engine = Arc::clone(&self.engine);
        let warnings = run_blocking(move || engine.warnings()).await?;
        Ok(filter_warnings(warnings))
    }

    pub(crate) async fn create_transaction(
        &self,
        directory_server_id: String,
        message_version: String,
    ) -> Result<Arc<dyn DeviceTransaction>, ThreeDsError> {
        let engine = Arc::clone(&self.engine);
        run_blocking(move || {
            engine.create_transaction(directory_server_id, message_version)
        })
        .await
    }
}

/// Extracts the authentication request parameters from a transaction,
/// promoting a missing parameter block to a contract violation.
pub(crate) async fn authentication_request_parameters(
    transaction: &Arc<dyn DeviceTransaction>,
) -> Result<AuthenticationRequestParameters, ThreeDsError> {
    let transaction = Arc::clone(transaction);
    run_blocking(move || transaction.authentication_request_parameters())
        .await?
        .ok_or_else(|| ThreeDsError::ContractViolation {
            detail: "device engine returned no authentication request parameters"
                .to_owned(),
        })
}

/// Runs a blocking device-engine call off the current thread.
pub(crate) async fn run_blocking<T, E, F>(f: F) -> Result<T, ThreeDsError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ThreeDsError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ThreeDsError::Engine {
            detail: format!("device engine task failed: {err}"),
        })?
        .map_err(Into::into)
}
