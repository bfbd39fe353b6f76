//! Binds a new passkey to a wallet address.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use n1nj4_core::{BindingRecord, TxHash, WalletAddress};
use thiserror::Error;

use super::{
    AuthenticatorError, CHALLENGE_LEN, CreatedCredential, PlatformAuthenticator, creation_options,
};
use crate::config::RelyingPartyConfig;
use crate::db::{BindingLookup, InsertOutcome, RepositoryError};

/// Errors that can occur while binding a passkey.
#[derive(Debug, Error)]
pub enum BindError {
    /// The user backed out of the passkey prompt.
    #[error("passkey creation was cancelled")]
    Cancelled,

    /// The authenticator failed for another reason.
    #[error("authenticator error: {0}")]
    Authenticator(String),

    /// The binding could not be stored.
    #[error("storage failed: {0}")]
    Persistence(#[source] RepositoryError),
}

impl From<AuthenticatorError> for BindError {
    fn from(e: AuthenticatorError) -> Self {
        match e {
            AuthenticatorError::Cancelled => Self::Cancelled,
            AuthenticatorError::Failed(message) => Self::Authenticator(message),
        }
    }
}

/// Result of a bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// A new binding was stored.
    Created(BindingRecord),
    /// The address was already bound; the stored record is returned.
    AlreadyBound(BindingRecord),
}

impl BindOutcome {
    /// The binding record, however it was obtained.
    #[must_use]
    pub const fn record(&self) -> &BindingRecord {
        match self {
            Self::Created(record) | Self::AlreadyBound(record) => record,
        }
    }

    /// Consume the outcome, returning the record.
    #[must_use]
    pub fn into_record(self) -> BindingRecord {
        match self {
            Self::Created(record) | Self::AlreadyBound(record) => record,
        }
    }

    /// Whether this call created the binding.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Creates a passkey and records the address binding.
#[derive(Clone)]
pub struct PasskeyBinder {
    lookup: BindingLookup,
    authenticator: Arc<dyn PlatformAuthenticator>,
    relying_party: RelyingPartyConfig,
}

impl PasskeyBinder {
    #[must_use]
    pub fn new(
        lookup: BindingLookup,
        authenticator: Arc<dyn PlatformAuthenticator>,
        relying_party: RelyingPartyConfig,
    ) -> Self {
        Self {
            lookup,
            authenticator,
            relying_party,
        }
    }

    /// Bind a new passkey to `address` unless it is already bound.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Cancelled` if the user aborts the passkey prompt.
    /// Returns `BindError::Persistence` if the store rejects the insert.
    #[tracing::instrument(skip(self), fields(address = %address))]
    pub async fn bind(&self, address: &WalletAddress) -> Result<BindOutcome, BindError> {
        if let Some(existing) = self.find_existing(address).await {
            return Ok(BindOutcome::AlreadyBound(existing));
        }

        let credential = self.create_credential(address).await?;
        self.persist(address, credential).await
    }

    /// Re-check for an existing binding right before prompting.
    pub async fn find_existing(&self, address: &WalletAddress) -> Option<BindingRecord> {
        self.lookup.find(address).await
    }

    /// Run the creation ceremony with a fresh challenge.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Cancelled` or `BindError::Authenticator` on
    /// authenticator failure.
    pub async fn create_credential(
        &self,
        address: &WalletAddress,
    ) -> Result<CreatedCredential, BindError> {
        let challenge: [u8; CHALLENGE_LEN] = rand::random();
        let options = creation_options(&self.relying_party, address, &challenge);

        let credential = self.authenticator.create(&options).await?;
        tracing::info!(passkey_id = %credential.id, "Passkey created");
        Ok(credential)
    }

    /// Store the binding for a created credential.
    ///
    /// Losing a concurrent race for the same address is not an error: the
    /// winner's record comes back as [`BindOutcome::AlreadyBound`] and the
    /// credential just created stays unbound.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Persistence` if the store fails.
    pub async fn persist(
        &self,
        address: &WalletAddress,
        credential: CreatedCredential,
    ) -> Result<BindOutcome, BindError> {
        let record = BindingRecord {
            address: address.clone(),
            passkey_id: credential.id,
            credential_id: Some(STANDARD.encode(&credential.raw_id)),
            public_key: credential.public_key,
            timestamp: Utc::now().timestamp_millis(),
            tx_hash: TxHash::from_bytes(&rand::random()),
        };

        let outcome = self
            .lookup
            .store()
            .insert_if_absent(&record)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to store binding");
                BindError::Persistence(e)
            })?;

        match outcome {
            InsertOutcome::Inserted(record) => {
                tracing::info!(tx_hash = %record.tx_hash, "Binding stored");
                Ok(BindOutcome::Created(record))
            }
            InsertOutcome::AlreadyBound(existing) => {
                tracing::warn!(
                    winner = %existing.passkey_id,
                    "Address bound by another session, new passkey left unbound"
                );
                Ok(BindOutcome::AlreadyBound(existing))
            }
        }
    }
}
