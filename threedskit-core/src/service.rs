use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    authentication::{AuthenticationClient, CHALLENGE_REQUIRED},
    challenge::{ChallengeOrchestrator, DeviceSession, TransactionGuard},
    config::{ServiceConfig, ThreeDsConfig},
    credentials::CredentialFetcher,
    device::{
        authentication_request_parameters, DeviceEngine, EngineAdapter,
        EngineConfig, SecurityWarning,
    },
    error::ThreeDsError,
    http_request::Request,
    outcome::ChallengeOutcome,
    session::{SessionClient, ThreeDsSession},
};

/// Orchestrates EMV 3DS2 authentications: device engine setup, the session
/// handshake, the issuer authentication decision and — when demanded — the
/// interactive challenge.
///
/// One instance serves one merchant configuration for its whole lifetime
/// and owns the single HTTP client every network-calling component uses.
/// The operations are strictly sequential per attempt:
/// [`initialize`](Self::initialize) once, then
/// [`create_session`](Self::create_session) followed by
/// [`start_challenge`](Self::start_challenge) per authentication.
#[derive(uniffi::Object)]
pub struct ThreeDsService {
    credentials: CredentialFetcher,
    sessions: SessionClient,
    authentication: AuthenticationClient,
    engine: EngineAdapter,
    region: crate::Region,
    locale: Option<String>,
    sandbox: bool,
    device_session: Mutex<Option<DeviceSession>>,
}

#[uniffi::export(async_runtime = "tokio")]
impl ThreeDsService {
    /// Builds a service from a validated configuration and a host-provided
    /// device engine.
    ///
    /// # Errors
    /// Fails with [`ThreeDsError::InvalidConfig`] when a required field is
    /// missing or the host override is not permitted.
    #[uniffi::constructor]
    pub fn new(
        config: ThreeDsConfig,
        engine: Arc<dyn DeviceEngine>,
    ) -> Result<Self, ThreeDsError> {
        let config = ServiceConfig::validate(config)?;
        Ok(Self::from_parts(config, engine))
    }

    /// Fetches the provider engine credentials and initializes the device
    /// engine, returning the device integrity warnings worth surfacing.
    ///
    /// # Errors
    /// Fails with [`ThreeDsError::Initialization`] wrapping the causing
    /// failure; no device-engine call is made when the credential fetch
    /// fails.
    pub async fn initialize(&self) -> Result<Vec<SecurityWarning>, ThreeDsError> {
        match self.initialize_inner().await {
            Ok(warnings) => {
                log::info!(
                    "3DS service initialized, {} security warnings",
                    warnings.len()
                );
                Ok(warnings)
            }
            Err(err) => {
                log::error!("{err}");
                Err(err.into_initialization())
            }
        }
    }

    /// Creates a backend session for the tokenized card, binds a device
    /// transaction to it and returns the updated session.
    ///
    /// # Errors
    /// Fails with [`ThreeDsError::SessionCreation`] wrapping the causing
    /// failure.
    pub async fn create_session(
        &self,
        token_id: String,
    ) -> Result<ThreeDsSession, ThreeDsError> {
        match self.create_session_inner(&token_id).await {
            Ok(session) => {
                log::info!("3DS session {} created", session.id);
                Ok(session)
            }
            Err(err) => {
                log::error!("{err}");
                Err(err.into_session_creation())
            }
        }
    }

    /// Requests the issuer authentication decision for the session and, when
    /// the decision demands it, drives the device challenge to its terminal
    /// outcome. The device transaction is always released before this
    /// returns.
    ///
    /// # Errors
    /// Fails with [`ThreeDsError::Authentication`] when no decision could be
    /// obtained, with [`ThreeDsError::ContractViolation`] when no open
    /// transaction exists or the device engine broke its contract, and with
    /// [`ThreeDsError::TransactionClose`] when the transaction could not be
    /// released. Challenge failures (cancellation, timeout, protocol and
    /// runtime errors) are not errors: they arrive as a failed
    /// [`ChallengeOutcome`].
    pub async fn start_challenge(
        &self,
        session_id: String,
    ) -> Result<ChallengeOutcome, ThreeDsError> {
        let device_session = self.current_device_session()?;

        let decision = match self
            .authentication
            .authenticate(&session_id)
            .await
        {
            Ok(decision) => {
                log::info!("3DS session {session_id} authenticated");
                decision
            }
            Err(err) => {
                log::error!("{err}");
                return Err(err.into_authentication());
            }
        };

        // The stored session is consumed either way; once the transaction
        // closes it is never reused.
        self.take_device_session();

        if decision.authentication_status != CHALLENGE_REQUIRED {
            Self::release(&device_session).await?;
            return Ok(ChallengeOutcome::from_decision(
                &session_id,
                &decision,
                None,
            ));
        }

        ChallengeOrchestrator::new(device_session)
            .run(&session_id, &decision)
            .await
    }
}

impl ThreeDsService {
    fn from_parts(config: ServiceConfig, engine: Arc<dyn DeviceEngine>) -> Self {
        let http = Arc::new(Request::new());
        Self {
            credentials: CredentialFetcher::new(Arc::clone(&http)),
            sessions: SessionClient::new(
                Arc::clone(&http),
                config.api_origin,
                config.api_key,
            ),
            authentication: AuthenticationClient::new(
                http,
                config.authentication_endpoint,
                config.authentication_headers,
            ),
            engine: EngineAdapter::new(engine),
            region: config.region,
            locale: config.locale,
            sandbox: config.sandbox,
            device_session: Mutex::new(None),
        }
    }

    async fn initialize_inner(&self) -> Result<Vec<SecurityWarning>, ThreeDsError> {
        let keys = self.credentials.fetch().await?;

        self.engine
            .initialize(EngineConfig {
                region: self.region.provider_code().to_owned(),
                api_token: keys.api_token(self.sandbox),
                locale: self.locale.clone(),
            })
            .await?;

        self.engine.security_warnings().await
    }

    async fn create_session_inner(
        &self,
        token_id: &str,
    ) -> Result<ThreeDsSession, ThreeDsError> {
        let created = self.sessions.create(token_id).await?;

        let transaction = self
            .engine
            .create_transaction(
                created.directory_server_id.clone(),
                created.recommended_version.clone(),
            )
            .await?;
        let parameters = authentication_request_parameters(&transaction).await?;

        let updated = self.sessions.update(&created.id, &parameters).await?;

        *self
            .device_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(DeviceSession {
            transaction: Arc::new(TransactionGuard::new(transaction)),
            parameters,
        });

        Ok(updated)
    }

    /// The session-phase output consumed by the challenge phase.
    fn current_device_session(&self) -> Result<DeviceSession, ThreeDsError> {
        self.device_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ThreeDsError::ContractViolation {
                detail: "no open device transaction; create_session must succeed first"
                    .to_owned(),
            })
    }

    fn take_device_session(&self) {
        self.device_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    async fn release(device_session: &DeviceSession) -> Result<(), ThreeDsError> {
        let guard = Arc::clone(&device_session.transaction);
        crate::device::run_blocking(move || guard.close()).await
    }
}

#[cfg(test)]
impl ThreeDsService {
    /// Builds a service against arbitrary origins, bypassing the host
    /// restriction (for mock servers).
    pub(crate) fn for_tests(
        api_origin: &str,
        authentication_endpoint: &str,
        engine: Arc<dyn DeviceEngine>,
    ) -> Self {
        Self::from_parts(
            ServiceConfig {
                api_origin: api_origin.to_owned(),
                api_key: "key_merchant".to_owned(),
                authentication_endpoint: authentication_endpoint.to_owned(),
                authentication_headers: std::collections::HashMap::new(),
                region: crate::Region::Eu,
                locale: None,
                sandbox: true,
            },
            engine,
        )
    }

    /// Points the credential fetcher at a mock origin.
    pub(crate) fn with_credentials_origin(mut self, origin: &str) -> Self {
        self.credentials = CredentialFetcher::with_origin(
            Arc::new(Request::new()),
            origin,
        );
        self
    }
}
