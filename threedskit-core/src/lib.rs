//! Core engine for orchestrating EMV 3-D Secure (3DS2) authentications on
//! behalf of a merchant application. Network calls go to the Basis Theory
//! 3DS API; device cryptography is delegated to an on-device 3DS engine
//! supplied by the host application through the [`DeviceEngine`] contract.

use strum::{Display, EnumString};

/// Provider region the merchant account is provisioned in.
///
/// Accounts default to the EU environment; the US environment is reserved
/// for accounts explicitly provisioned there by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, uniffi::Enum)]
#[strum(serialize_all = "lowercase")]
pub enum Region {
    /// European provider environment.
    Eu,
    /// United States provider environment.
    Us,
}

impl Region {
    /// Environment identifier expected by the on-device 3DS engine.
    #[must_use]
    pub(crate) const fn provider_code(self) -> &'static str {
        match self {
            Self::Eu => "EuLive",
            Self::Us => "USLive",
        }
    }
}

mod authentication;
pub use authentication::*;

mod challenge;

mod config;
pub use config::*;

mod device;
pub use device::*;

mod error;
pub use error::*;

pub mod logger;

mod outcome;
pub use outcome::*;

mod service;
pub use service::*;

mod session;
pub use session::*;

// private modules
mod credentials;
mod http_request;

#[cfg(test)]
mod test_support;

uniffi::setup_scaffolding!("threedskit_core");
