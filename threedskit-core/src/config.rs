use std::collections::HashMap;

use crate::{error::ThreeDsError, Region};

/// Default backend API host.
const DEFAULT_API_HOST: &str = "api.basistheory.com";

/// The only host the default may be overridden with; internal use only.
const DEV_API_HOST: &str = "api.flock-dev.com";

/// Caller-supplied configuration for a [`crate::ThreeDsService`].
///
/// Validated once at service construction; construction fails fast on
/// missing required fields rather than deferring to the first network call.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ThreeDsConfig {
    /// Merchant API key sent on every backend call.
    pub api_key: String,
    /// Endpoint of the merchant backend that produces authentication
    /// decisions.
    pub authentication_endpoint: String,
    /// Headers forwarded verbatim to the authentication endpoint.
    pub authentication_headers: HashMap<String, String>,
    /// Provider region the merchant account lives in.
    pub region: Region,
    /// BCP-47 locale for challenge rendering; the device locale applies
    /// when absent.
    pub locale: Option<String>,
    /// Selects the provider's test credentials instead of the live ones.
    pub sandbox: bool,
    /// Backend host override; internal use only.
    pub api_base_url: Option<String>,
}

/// Validated, immutable view of a [`ThreeDsConfig`].
pub(crate) struct ServiceConfig {
    pub(crate) api_origin: String,
    pub(crate) api_key: String,
    pub(crate) authentication_endpoint: String,
    pub(crate) authentication_headers: HashMap<String, String>,
    pub(crate) region: Region,
    pub(crate) locale: Option<String>,
    pub(crate) sandbox: bool,
}

impl ServiceConfig {
    pub(crate) fn validate(config: ThreeDsConfig) -> Result<Self, ThreeDsError> {
        if config.api_key.trim().is_empty() {
            return Err(invalid("api_key", "must not be empty"));
        }
        if config.authentication_endpoint.trim().is_empty() {
            return Err(invalid("authentication_endpoint", "must not be empty"));
        }

        let host = match config.api_base_url.as_deref() {
            None => DEFAULT_API_HOST,
            Some(DEV_API_HOST) => DEV_API_HOST,
            Some(_) => {
                return Err(invalid(
                    "api_base_url",
                    &format!("only {DEV_API_HOST} may override the default host"),
                ));
            }
        };

        Ok(Self {
            api_origin: format!("https://{host}"),
            api_key: config.api_key,
            authentication_endpoint: config.authentication_endpoint,
            authentication_headers: config.authentication_headers,
            region: config.region,
            locale: config.locale,
            sandbox: config.sandbox,
        })
    }
}

fn invalid(attribute: &str, reason: &str) -> ThreeDsError {
    ThreeDsError::InvalidConfig {
        attribute: attribute.to_owned(),
        reason: reason.to_owned(),
    }
}
