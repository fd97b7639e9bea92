use thiserror::Error;

/// Error outputs from the 3DS engine.
///
/// Failures during a pipeline phase are wrapped into that phase's variant
/// (`Initialization`, `SessionCreation`, `Authentication`) with the causing
/// error boxed inside, so callers can still observe e.g. the HTTP status of
/// an underlying [`ThreeDsError::Service`] failure via
/// [`ThreeDsError::service_status`].
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum ThreeDsError {
    /// Failed to initialize the 3DS service.
    #[error("failed to initialize 3DS service: {source}")]
    Initialization {
        /// Underlying failure.
        source: Box<ThreeDsError>,
    },
    /// Unable to create or update a 3DS session.
    #[error("unable to create session: {source}")]
    SessionCreation {
        /// Underlying failure.
        source: Box<ThreeDsError>,
    },
    /// Unable to obtain an authentication decision for a session.
    #[error("unable to authenticate: {source}")]
    Authentication {
        /// Underlying failure.
        source: Box<ThreeDsError>,
    },
    /// The 3DS backend responded with a non-2xx status.
    #[error("3DS service responded {status}")]
    Service {
        /// HTTP status code of the response.
        status: u16,
    },
    /// Transport-level failure reaching an endpoint.
    #[error("network error calling {url}: {error}")]
    Network {
        /// The URL that was being called.
        url: String,
        /// Transport error details.
        error: String,
    },
    /// A response body could not be decoded.
    #[error("serialization error: {detail}")]
    Serialization {
        /// Decode error details.
        detail: String,
    },
    /// The on-device engine broke its operation contract, e.g. returned no
    /// authentication request parameters or an unmapped transaction status.
    #[error("device engine contract violation: {detail}")]
    ContractViolation {
        /// Contract violation details.
        detail: String,
    },
    /// Releasing a device transaction failed. Fatal; never retried.
    #[error("unable to close transaction: {detail}")]
    TransactionClose {
        /// Close failure details.
        detail: String,
    },
    /// The on-device engine reported a failure.
    #[error("device engine failure: {detail}")]
    Engine {
        /// Engine failure details.
        detail: String,
    },
    /// The service configuration is invalid.
    #[error("invalid configuration for `{attribute}`: {reason}")]
    InvalidConfig {
        /// Name of the offending configuration attribute.
        attribute: String,
        /// Why the attribute was rejected.
        reason: String,
    },
}

impl ThreeDsError {
    pub(crate) fn into_initialization(self) -> Self {
        Self::Initialization {
            source: Box::new(self),
        }
    }

    pub(crate) fn into_session_creation(self) -> Self {
        Self::SessionCreation {
            source: Box::new(self),
        }
    }

    pub(crate) fn into_authentication(self) -> Self {
        Self::Authentication {
            source: Box::new(self),
        }
    }

    /// HTTP status of the closest [`ThreeDsError::Service`] failure in the
    /// error chain, if any.
    #[must_use]
    pub fn service_status(&self) -> Option<u16> {
        match self {
            Self::Service { status } => Some(*status),
            Self::Initialization { source }
            | Self::SessionCreation { source }
            | Self::Authentication { source } => source.service_status(),
            _ => None,
        }
    }
}

/// Failure raised by a host-provided [`crate::DeviceEngine`] implementation.
///
/// Separate from [`ThreeDsError`] so foreign implementations can construct
/// and raise it across the FFI boundary.
#[derive(Debug, Error, uniffi::Error)]
pub enum DeviceEngineError {
    /// The engine operation failed.
    #[error("{detail}")]
    Failed {
        /// Engine-reported failure details.
        detail: String,
    },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for DeviceEngineError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Failed {
            detail: format!("unexpected uniffi callback error: {}", error.reason),
        }
    }
}

impl From<DeviceEngineError> for ThreeDsError {
    fn from(value: DeviceEngineError) -> Self {
        Self::Engine {
            detail: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_status_through_phase_wrappers() {
        let err = ThreeDsError::Service { status: 503 }.into_initialization();
        assert_eq!(err.service_status(), Some(503));

        let err = ThreeDsError::Service { status: 422 }.into_session_creation();
        assert_eq!(err.service_status(), Some(422));

        let err = ThreeDsError::Serialization {
            detail: "bad json".to_owned(),
        }
        .into_authentication();
        assert_eq!(err.service_status(), None);
    }

    #[test]
    fn test_phase_wrapper_display_includes_cause() {
        let err = ThreeDsError::Service { status: 503 }.into_initialization();
        assert_eq!(
            err.to_string(),
            "failed to initialize 3DS service: 3DS service responded 503"
        );
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: ThreeDsError = DeviceEngineError::Failed {
            detail: "sdk not ready".to_owned(),
        }
        .into();
        assert!(matches!(err, ThreeDsError::Engine { detail } if detail == "sdk not ready"));
    }
}
