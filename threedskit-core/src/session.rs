use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    device::AuthenticationRequestParameters, error::ThreeDsError,
    http_request::Request,
};

/// Header carrying the merchant API key on backend calls.
pub(crate) const API_KEY_HEADER: &str = "BT-API-KEY";

/// Device type reported when creating app-based sessions.
const DEVICE_TYPE: &str = "app";

/// Maximum challenge timeout communicated to the backend, in minutes.
/// Matches the timeout handed to the device engine.
const SDK_MAX_TIMEOUT: &str = "05";

/// A 3DS session created by the backend for a single authentication
/// attempt. The backend record is updated in place with the device
/// parameters; the session itself never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct ThreeDsSession {
    /// Unique session identifier.
    pub id: String,
    /// 3DS method URL for the card range, when the issuer provides one.
    pub method_url: String,
    /// Card brand, e.g. `visa`.
    #[serde(rename = "cardBrand")]
    pub card_brand: String,
    /// Notification URL the method iframe reports back to.
    pub method_notification_url: String,
    /// Directory server identifier for the card range.
    pub directory_server_id: String,
    /// Protocol version recommended by the backend.
    pub recommended_version: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    pan: &'a str,
    device: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateSessionRequest {
    device_info: DeviceInfo,
}

#[derive(Debug, Serialize)]
struct DeviceInfo {
    sdk_transaction_id: String,
    sdk_application_id: String,
    sdk_encryption_data: String,
    sdk_ephemeral_public_key: String,
    sdk_max_timeout: &'static str,
    sdk_reference_number: String,
    sdk_render_options: RenderOptions,
}

#[derive(Debug, Serialize)]
struct RenderOptions {
    sdk_interface: &'static str,
    sdk_ui_type: Vec<&'static str>,
}

/// Rendering interface supported by the app.
#[derive(Debug, Clone, Copy)]
enum SdkInterface {
    Native,
}

impl SdkInterface {
    const fn code(self) -> &'static str {
        match self {
            Self::Native => "01",
        }
    }
}

/// Challenge UI types the app can render.
#[derive(Debug, Clone, Copy)]
enum UiType {
    TextField,
    SingleSelectField,
    MultiSelectField,
    OutOfBand,
}

impl UiType {
    const fn code(self) -> &'static str {
        match self {
            Self::TextField => "01",
            Self::SingleSelectField => "02",
            Self::MultiSelectField => "03",
            Self::OutOfBand => "04",
        }
    }
}

impl RenderOptions {
    /// UI customization is not supported; every session advertises the
    /// native interface with all challenge UI types.
    fn native() -> Self {
        Self {
            sdk_interface: SdkInterface::Native.code(),
            sdk_ui_type: vec![
                UiType::TextField.code(),
                UiType::SingleSelectField.code(),
                UiType::MultiSelectField.code(),
                UiType::OutOfBand.code(),
            ],
        }
    }
}

/// Two-phase session handshake against the backend API: create a session
/// for a payment-instrument token, then bind the device parameters to it.
pub(crate) struct SessionClient {
    http: Arc<Request>,
    api_origin: String,
    api_key: String,
}

impl SessionClient {
    pub(crate) fn new(http: Arc<Request>, api_origin: String, api_key: String) -> Self {
        Self {
            http,
            api_origin,
            api_key,
        }
    }

    /// Creates a session for the tokenized card.
    pub(crate) async fn create(
        &self,
        token_id: &str,
    ) -> Result<ThreeDsSession, ThreeDsError> {
        let url = format!("{}/3ds/sessions", self.api_origin);
        let body = CreateSessionRequest {
            pan: token_id,
            device: DEVICE_TYPE,
        };

        self.http
            .send_json(
                self.http
                    .post(&url)
                    .header(API_KEY_HEADER, &self.api_key)
                    .json(&body),
            )
            .await
    }

    /// Binds the device-engine parameters to the session record.
    pub(crate) async fn update(
        &self,
        session_id: &str,
        parameters: &AuthenticationRequestParameters,
    ) -> Result<ThreeDsSession, ThreeDsError> {
        let url = format!("{}/3ds/sessions/{session_id}", self.api_origin);
        let body = UpdateSessionRequest {
            device_info: DeviceInfo {
                sdk_transaction_id: parameters.sdk_transaction_id.clone(),
                sdk_application_id: parameters.sdk_app_id.clone(),
                sdk_encryption_data: parameters.device_data.clone(),
                sdk_ephemeral_public_key: parameters
                    .sdk_ephemeral_public_key
                    .clone(),
                sdk_max_timeout: SDK_MAX_TIMEOUT,
                sdk_reference_number: parameters.sdk_reference_number.clone(),
                sdk_render_options: RenderOptions::native(),
            },
        };

        self.http
            .send_json(
                self.http
                    .put(&url)
                    .header(API_KEY_HEADER, &self.api_key)
                    .json(&body),
            )
            .await
    }
}
