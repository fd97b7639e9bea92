//! A stand-in for a platform 3DS SDK: deterministic device parameters, no
//! integrity findings, and challenges that resolve with a scripted event.
//! Useful for exercising sandbox sessions from a workstation, where no real
//! EMVCo-certified device SDK exists.

use std::sync::Arc;

use threedskit_core::{
    AuthenticationRequestParameters, ChallengeParameters,
    ChallengeStatusReceiver, DeviceEngine, DeviceEngineError, DeviceTransaction,
    EngineConfig, SecurityWarning,
};

/// Simulated on-device 3DS engine.
pub struct SimulatedDeviceEngine {
    challenge_event: String,
}

impl SimulatedDeviceEngine {
    /// `challenge_event` is either a transaction-status letter the challenge
    /// completes with, or one of `cancel` / `timeout` to simulate those
    /// terminal events.
    pub fn new(challenge_event: String) -> Self {
        Self { challenge_event }
    }
}

impl DeviceEngine for SimulatedDeviceEngine {
    fn initialize(&self, config: EngineConfig) -> Result<(), DeviceEngineError> {
        log::info!(
            "simulated device engine initialized for region {}",
            config.region
        );
        Ok(())
    }

    fn warnings(&self) -> Result<Vec<SecurityWarning>, DeviceEngineError> {
        // A simulated device has nothing to warn about.
        Ok(Vec::new())
    }

    fn create_transaction(
        &self,
        directory_server_id: String,
        message_version: String,
    ) -> Result<Arc<dyn DeviceTransaction>, DeviceEngineError> {
        log::info!(
            "simulated transaction created for directory server {directory_server_id} \
             (protocol {message_version})"
        );
        Ok(Arc::new(SimulatedTransaction {
            challenge_event: self.challenge_event.clone(),
            message_version,
        }))
    }
}

struct SimulatedTransaction {
    challenge_event: String,
    message_version: String,
}

impl DeviceTransaction for SimulatedTransaction {
    fn authentication_request_parameters(
        &self,
    ) -> Result<Option<AuthenticationRequestParameters>, DeviceEngineError> {
        Ok(Some(AuthenticationRequestParameters {
            sdk_transaction_id: "sim-txn-0001".to_owned(),
            sdk_app_id: "sim-app-0001".to_owned(),
            sdk_reference_number: "3DS_LOA_SDK_SIMU_000001_00001".to_owned(),
            sdk_ephemeral_public_key:
                r#"{"kty":"EC","crv":"P-256","x":"c2ltdWxhdGVkLXgtY29vcmQ","y":"c2ltdWxhdGVkLXktY29vcmQ"}"#
                    .to_owned(),
            device_data: "c2ltdWxhdGVkLWRldmljZS1kYXRh".to_owned(),
            message_version: Some(self.message_version.clone()),
        }))
    }

    fn do_challenge(
        &self,
        parameters: ChallengeParameters,
        timeout_minutes: u32,
        receiver: Arc<dyn ChallengeStatusReceiver>,
    ) -> Result<(), DeviceEngineError> {
        log::info!(
            "simulated challenge started for {} ({timeout_minutes} minute timeout)",
            parameters.three_ds_server_transaction_id
        );

        let event = self.challenge_event.clone();
        std::thread::spawn(move || match event.as_str() {
            "cancel" => receiver.cancelled(),
            "timeout" => receiver.timed_out(),
            letter => receiver.completed(letter.to_owned()),
        });

        Ok(())
    }

    fn close(&self) -> Result<(), DeviceEngineError> {
        log::info!("simulated transaction closed");
        Ok(())
    }
}
