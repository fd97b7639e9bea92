use serde::Serialize;
use strum::Display;

use crate::{authentication::AuthenticationDecision, error::ThreeDsError};

/// Canonical terminal status of an authentication attempt. No raw provider
/// code ever reaches callers; every path normalizes into one of these five
/// values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, uniffi::Enum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// Authentication succeeded.
    Successful,
    /// Authentication was attempted but not completed by the issuer.
    Attempted,
    /// Authentication failed or was abandoned.
    Failed,
    /// Authentication could not be performed.
    Unavailable,
    /// The issuer rejected the authentication.
    Rejected,
}

impl ChallengeStatus {
    /// Maps an EMVCo single-letter transaction status to its canonical
    /// value.
    ///
    /// # Errors
    /// An unmapped letter is a device-engine contract violation, never a
    /// silent default.
    pub fn from_transaction_status(status: &str) -> Result<Self, ThreeDsError> {
        match status {
            "Y" => Ok(Self::Successful),
            "A" => Ok(Self::Attempted),
            "N" => Ok(Self::Failed),
            "U" => Ok(Self::Unavailable),
            "R" => Ok(Self::Rejected),
            other => Err(ThreeDsError::ContractViolation {
                detail: format!("unmapped transaction status {other:?}"),
            }),
        }
    }

    /// Maps an authentication-decision status to its canonical value for
    /// the non-challenge paths. `frictionless` is an alias of `successful`;
    /// anything unrecognized (including `challenge` itself on the
    /// construction-failure path) collapses to `failed` so no raw status
    /// escapes.
    pub(crate) fn from_decision_status(status: &str) -> Self {
        match status {
            "successful" | "frictionless" => Self::Successful,
            "attempted" => Self::Attempted,
            "unavailable" => Self::Unavailable,
            "rejected" => Self::Rejected,
            _ => Self::Failed,
        }
    }
}

/// Terminal artifact of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Record)]
pub struct ChallengeOutcome {
    /// The session the attempt belongs to.
    pub session_id: String,
    /// Canonical terminal status.
    pub status: ChallengeStatus,
    /// Status reason, when one was reported or produced.
    pub reason: Option<String>,
}

impl ChallengeOutcome {
    /// Builds an outcome directly from an authentication decision, for the
    /// paths that never reach a challenge callback. `reason_override`
    /// replaces the decision's own status reason (used when challenge
    /// construction fails and the failure detail becomes the reason).
    pub(crate) fn from_decision(
        session_id: &str,
        decision: &AuthenticationDecision,
        reason_override: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.to_owned(),
            status: ChallengeStatus::from_decision_status(
                &decision.authentication_status,
            ),
            reason: reason_override
                .or_else(|| decision.authentication_status_reason.clone()),
        }
    }
}
