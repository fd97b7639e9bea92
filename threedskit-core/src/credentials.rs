use std::sync::Arc;

use serde::Deserialize;

use crate::{error::ThreeDsError, http_request::Request};

/// Fixed CDN location of the provider key document.
const KEYS_URL: &str = "https://cdn.basistheory.com/keys/3ds.json";

/// Environment-scoped API tokens for the on-device 3DS engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub(crate) struct ProviderKeys {
    pub(crate) test: String,
    pub(crate) live: String,
}

impl ProviderKeys {
    /// Selects the token matching the configured environment and formats it
    /// the way the device engine expects it.
    pub(crate) fn api_token(&self, sandbox: bool) -> String {
        let token = if sandbox { &self.test } else { &self.live };
        format!("Bearer {token}")
    }
}

/// Retrieves the environment-scoped engine credentials from the provider CDN.
///
/// Pure and idempotent; safe for the caller to retry.
pub(crate) struct CredentialFetcher {
    http: Arc<Request>,
    url: String,
}

impl CredentialFetcher {
    pub(crate) fn new(http: Arc<Request>) -> Self {
        Self {
            http,
            url: KEYS_URL.to_owned(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_origin(http: Arc<Request>, origin: &str) -> Self {
        Self {
            http,
            url: format!("{origin}/keys/3ds.json"),
        }
    }

    pub(crate) async fn fetch(&self) -> Result<ProviderKeys, ThreeDsError> {
        self.http.send_json(self.http.get(&self.url)).await
    }
}
