//! Passkey creation and binding.
//!
//! The ceremony itself runs in a platform authenticator behind the
//! [`PlatformAuthenticator`] trait. This crate builds the creation options,
//! collects the resulting credential, and persists the binding.

mod binder;
mod handoff;
mod options;

pub use binder::{BindError, BindOutcome, PasskeyBinder};
pub use handoff::HandoffAuthenticator;
pub use options::{CHALLENGE_LEN, ES256, RS256, TIMEOUT_MS, creation_options};
pub use webauthn_rs_proto::PublicKeyCredentialCreationOptions;

use thiserror::Error;

/// Errors reported by a platform authenticator.
#[derive(Debug, Error)]
pub enum AuthenticatorError {
    /// The user dismissed the prompt or the ceremony timed out.
    #[error("passkey creation was cancelled")]
    Cancelled,

    /// The authenticator failed or returned something unusable.
    #[error("authenticator failed: {0}")]
    Failed(String),
}

/// A freshly created public-key credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCredential {
    /// Credential id as reported (base64url).
    pub id: String,
    /// Raw credential id bytes.
    pub raw_id: Vec<u8>,
    /// SPKI public key, if the authenticator exposes it.
    pub public_key: Option<String>,
}

/// Runs a `navigator.credentials.create`-style ceremony.
#[async_trait::async_trait]
pub trait PlatformAuthenticator: Send + Sync {
    /// Create a credential for the given options.
    async fn create(
        &self,
        options: &PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError>;
}
