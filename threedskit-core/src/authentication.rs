use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{error::ThreeDsError, http_request::Request};

/// Decision status value that requires the interactive challenge step.
pub(crate) const CHALLENGE_REQUIRED: &str = "challenge";

/// Issuer-side authentication decision for a session.
///
/// Produced once per attempt by the caller-configured authentication
/// endpoint and consumed once by the challenge orchestration; optional
/// fields are only populated when the issuer demands a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationDecision {
    /// Token identifier of the authenticated card.
    pub pan_token_id: String,
    /// Protocol version the authentication ran under.
    pub threeds_version: String,
    /// ACS transaction identifier.
    pub acs_transaction_id: String,
    /// Directory server transaction identifier.
    pub ds_transaction_id: String,
    /// Device SDK transaction identifier echoed by the backend.
    pub sdk_transaction_id: String,
    /// ACS reference number.
    pub acs_reference_number: String,
    /// Directory server reference number.
    pub ds_reference_number: String,
    /// Cryptographic authentication value (CAVV), when issued.
    #[serde(default)]
    pub authentication_value: String,
    /// Decision status, e.g. `frictionless`, `challenge`, `rejected`.
    pub authentication_status: String,
    /// Human-readable reason accompanying the status, when reported.
    pub authentication_status_reason: Option<String>,
    /// Numeric status code accompanying the status.
    pub authentication_status_code: String,
    /// Electronic commerce indicator, when issued.
    #[serde(default)]
    pub eci: String,
    /// Purchase amount in minor units.
    pub purchase_amount: String,
    /// Merchant display name.
    pub merchant_name: String,
    /// Purchase currency code.
    pub currency: Option<String>,
    /// Whether the ACS mandated the challenge.
    pub acs_challenge_mandated: Option<String>,
    /// Challenge type selected by the issuer.
    pub authentication_challenge_type: Option<String>,
    /// ACS signed content (JWS) for the challenge.
    pub acs_signed_content: Option<String>,
    /// Raw 3DS message extensions.
    #[serde(default)]
    pub message_extensions: Vec<String>,
    /// ACS rendering hints for the challenge UI.
    pub acs_rendering_type: Option<AcsRenderingType>,
}

/// ACS rendering hints for the challenge UI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcsRenderingType {
    /// Interface the ACS will render, native or HTML.
    pub acs_interface: String,
    /// UI template the ACS selected.
    pub acs_ui_template: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    session_id: &'a str,
}

/// Submits a session to the caller-configured authentication endpoint for
/// an issuer decision. The endpoint and its headers are supplied by the
/// merchant backend, which owns risk decisioning downstream.
pub(crate) struct AuthenticationClient {
    http: Arc<Request>,
    endpoint: String,
    headers: HashMap<String, String>,
}

impl AuthenticationClient {
    pub(crate) fn new(
        http: Arc<Request>,
        endpoint: String,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            http,
            endpoint,
            headers,
        }
    }

    pub(crate) async fn authenticate(
        &self,
        session_id: &str,
    ) -> Result<AuthenticationDecision, ThreeDsError> {
        let mut builder = self
            .http
            .post(&self.endpoint)
            .json(&AuthenticateRequest { session_id });

        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        self.http.send_json(builder).await
    }
}
