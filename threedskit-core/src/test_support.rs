//! Shared fixtures for the in-crate tests: canned wire bodies, a scriptable
//! mock device engine and decision builders.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    authentication::AuthenticationDecision,
    device::{
        AuthenticationRequestParameters, ChallengeParameters,
        ChallengeStatusReceiver, DeviceEngine, DeviceTransaction, EngineConfig,
        SecurityWarning, WarningSeverity,
    },
    error::DeviceEngineError,
};

pub(crate) const KEYS_BODY: &str = r#"{"test":"key_test","live":"key_live"}"#;

pub(crate) const SESSION_BODY: &str = r#"{
    "id": "sess_1",
    "method_url": "https://acs.example/method",
    "cardBrand": "visa",
    "method_notification_url": "https://api.example/notify",
    "directory_server_id": "DS1",
    "recommended_version": "2.2.0"
}"#;

pub(crate) const DECISION_FRICTIONLESS_BODY: &str = r#"{
    "panTokenId": "tok_123",
    "threedsVersion": "2.2.0",
    "acsTransactionId": "acs-txn-1",
    "dsTransactionId": "ds-txn-1",
    "sdkTransactionId": "sdk-txn-1",
    "acsReferenceNumber": "acs-ref-1",
    "dsReferenceNumber": "ds-ref-1",
    "authenticationValue": "cavv-1",
    "authenticationStatus": "frictionless",
    "authenticationStatusCode": "245",
    "eci": "05",
    "purchaseAmount": "1000",
    "merchantName": "Example Store",
    "currency": "978"
}"#;

pub(crate) const DECISION_CHALLENGE_BODY: &str = r#"{
    "panTokenId": "tok_123",
    "threedsVersion": "2.2.0",
    "acsTransactionId": "acs-txn-1",
    "dsTransactionId": "ds-txn-1",
    "sdkTransactionId": "sdk-txn-1",
    "acsReferenceNumber": "acs-ref-1",
    "dsReferenceNumber": "ds-ref-1",
    "authenticationStatus": "challenge",
    "authenticationStatusCode": "1A0",
    "purchaseAmount": "1000",
    "merchantName": "Example Store",
    "currency": "978",
    "acsChallengeMandated": "Y",
    "authenticationChallengeType": "02",
    "acsSignedContent": "signed-jws"
}"#;

/// Device parameters the mock transaction reports.
pub(crate) fn request_parameters() -> AuthenticationRequestParameters {
    AuthenticationRequestParameters {
        sdk_transaction_id: "sdk-txn-1".to_owned(),
        sdk_app_id: "sdk-app-1".to_owned(),
        sdk_reference_number: "sdk-ref-1".to_owned(),
        sdk_ephemeral_public_key: "ephemeral-key-1".to_owned(),
        device_data: "device-data-1".to_owned(),
        message_version: Some("2.2.0".to_owned()),
    }
}

/// Builds a minimal decision with the given status and reason.
pub(crate) fn decision(
    status: &str,
    reason: Option<&str>,
) -> AuthenticationDecision {
    AuthenticationDecision {
        pan_token_id: "tok_123".to_owned(),
        threeds_version: "2.2.0".to_owned(),
        acs_transaction_id: "acs-txn-1".to_owned(),
        ds_transaction_id: "ds-txn-1".to_owned(),
        sdk_transaction_id: "sdk-txn-1".to_owned(),
        acs_reference_number: "acs-ref-1".to_owned(),
        ds_reference_number: "ds-ref-1".to_owned(),
        authentication_value: String::new(),
        authentication_status: status.to_owned(),
        authentication_status_reason: reason.map(ToOwned::to_owned),
        authentication_status_code: "1A0".to_owned(),
        eci: String::new(),
        purchase_amount: "1000".to_owned(),
        merchant_name: "Example Store".to_owned(),
        currency: Some("978".to_owned()),
        acs_challenge_mandated: Some("Y".to_owned()),
        authentication_challenge_type: Some("02".to_owned()),
        acs_signed_content: Some("signed-jws".to_owned()),
        message_extensions: Vec::new(),
        acs_rendering_type: None,
    }
}

/// How a mock transaction reacts to `do_challenge`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ChallengeScript {
    /// Fire `completed` with the given transaction-status letter.
    Complete(&'static str),
    /// Fire `cancelled`.
    Cancel,
    /// Fire `timed_out`.
    Timeout,
    /// Fire `protocol_error` with the given message.
    ProtocolError(&'static str),
    /// Fire `runtime_error` with the given message.
    RuntimeError(&'static str),
    /// Refuse to start the challenge with the given failure.
    Refuse(&'static str),
    /// Accept the challenge but never fire any event.
    Silent,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable stand-in for a device transaction, recording challenge
/// parameters and close calls.
pub(crate) struct MockTransaction {
    script: ChallengeScript,
    parameters_available: bool,
    close_fails: bool,
    close_count: Mutex<usize>,
    challenge_parameters: Mutex<Option<ChallengeParameters>>,
}

impl MockTransaction {
    pub(crate) fn new(script: ChallengeScript) -> Self {
        Self {
            script,
            parameters_available: true,
            close_fails: false,
            close_count: Mutex::new(0),
            challenge_parameters: Mutex::new(None),
        }
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.close_fails = true;
        self
    }

    fn without_parameters(mut self) -> Self {
        self.parameters_available = false;
        self
    }

    pub(crate) fn close_count(&self) -> usize {
        *lock(&self.close_count)
    }

    pub(crate) fn recorded_challenge_parameters(
        &self,
    ) -> Option<ChallengeParameters> {
        lock(&self.challenge_parameters).clone()
    }
}

impl DeviceTransaction for MockTransaction {
    fn authentication_request_parameters(
        &self,
    ) -> Result<Option<AuthenticationRequestParameters>, DeviceEngineError> {
        if self.parameters_available {
            Ok(Some(request_parameters()))
        } else {
            Ok(None)
        }
    }

    fn do_challenge(
        &self,
        parameters: ChallengeParameters,
        _timeout_minutes: u32,
        receiver: Arc<dyn ChallengeStatusReceiver>,
    ) -> Result<(), DeviceEngineError> {
        *lock(&self.challenge_parameters) = Some(parameters);

        match self.script {
            ChallengeScript::Complete(letter) => receiver.completed(letter.to_owned()),
            ChallengeScript::Cancel => receiver.cancelled(),
            ChallengeScript::Timeout => receiver.timed_out(),
            ChallengeScript::ProtocolError(message) => {
                receiver.protocol_error(message.to_owned());
            }
            ChallengeScript::RuntimeError(message) => {
                receiver.runtime_error(message.to_owned());
            }
            ChallengeScript::Refuse(detail) => {
                return Err(DeviceEngineError::Failed {
                    detail: detail.to_owned(),
                });
            }
            ChallengeScript::Silent => {}
        }

        Ok(())
    }

    fn close(&self) -> Result<(), DeviceEngineError> {
        *lock(&self.close_count) += 1;
        if self.close_fails {
            return Err(DeviceEngineError::Failed {
                detail: "sdk refused to release".to_owned(),
            });
        }
        Ok(())
    }
}

/// Scriptable stand-in for a device engine, recording every call.
pub(crate) struct MockDeviceEngine {
    script: ChallengeScript,
    parameters_available: bool,
    calls: Mutex<Vec<String>>,
    initialized_with: Mutex<Option<EngineConfig>>,
    transaction: Mutex<Option<Arc<MockTransaction>>>,
}

impl MockDeviceEngine {
    pub(crate) fn new(script: ChallengeScript) -> Self {
        Self {
            script,
            parameters_available: true,
            calls: Mutex::new(Vec::new()),
            initialized_with: Mutex::new(None),
            transaction: Mutex::new(None),
        }
    }

    pub(crate) fn without_parameters(mut self) -> Self {
        self.parameters_available = false;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn initialized_with(&self) -> Option<EngineConfig> {
        lock(&self.initialized_with).clone()
    }

    /// Close count of the last created transaction; zero when none exists.
    pub(crate) fn transaction_close_count(&self) -> usize {
        lock(&self.transaction)
            .as_ref()
            .map_or(0, |transaction| transaction.close_count())
    }

    /// Challenge parameters recorded by the last created transaction.
    pub(crate) fn challenge_parameters(&self) -> Option<ChallengeParameters> {
        lock(&self.transaction)
            .as_ref()
            .and_then(|transaction| transaction.recorded_challenge_parameters())
    }

    fn record(&self, call: &str) {
        lock(&self.calls).push(call.to_owned());
    }
}

impl DeviceEngine for MockDeviceEngine {
    fn initialize(&self, config: EngineConfig) -> Result<(), DeviceEngineError> {
        self.record("initialize");
        *lock(&self.initialized_with) = Some(config);
        Ok(())
    }

    fn warnings(&self) -> Result<Vec<SecurityWarning>, DeviceEngineError> {
        self.record("warnings");
        Ok(vec![
            SecurityWarning {
                id: "SW01".to_owned(),
                message: "The device is jailbroken".to_owned(),
                severity: WarningSeverity::High,
            },
            SecurityWarning {
                id: "SW99".to_owned(),
                message: "Mercury is in retrograde".to_owned(),
                severity: WarningSeverity::Low,
            },
        ])
    }

    fn create_transaction(
        &self,
        _directory_server_id: String,
        _message_version: String,
    ) -> Result<Arc<dyn DeviceTransaction>, DeviceEngineError> {
        self.record("create_transaction");

        let mut transaction = MockTransaction::new(self.script);
        if !self.parameters_available {
            transaction = transaction.without_parameters();
        }
        let transaction = Arc::new(transaction);
        *lock(&self.transaction) = Some(Arc::clone(&transaction));
        Ok(transaction)
    }
}
