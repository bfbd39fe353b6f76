//! Unified error type for the verification flow.

use thiserror::Error;

use crate::chain::NftError;
use crate::db::RepositoryError;
use crate::passkey::BindError;
use crate::wallet::WalletError;

/// Errors surfaced by flow transitions.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Wallet connection failed.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// NFT ownership check failed.
    #[error(transparent)]
    Nft(#[from] NftError),

    /// Passkey bind failed.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Binding store failed on a strict path.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The handover path failed unexpectedly.
    #[error("auto-login failed: {0}")]
    AutoLogin(String),

    /// A transition was called in a state that does not allow it.
    #[error("verification process interrupted: {0}")]
    Interrupted(String),
}

impl FlowError {
    /// Message shown to the user, with chain and collection names filled in.
    #[must_use]
    pub fn user_message(&self, chain_name: &str, nft_name: &str) -> String {
        match self {
            Self::Wallet(WalletError::ExtensionMissing) => {
                "Please install MetaMask to continue.".to_string()
            }
            Self::Wallet(WalletError::NetworkMismatch { .. }) => {
                format!("Please switch to {chain_name}")
            }
            Self::Wallet(_) => "Connection failed".to_string(),
            Self::Nft(NftError::NotFound) => {
                format!("NFT Verification Required: {nft_name} not found.")
            }
            Self::Nft(NftError::Network(_)) => {
                format!("Communication error with {chain_name} network.")
            }
            Self::Bind(BindError::Cancelled) => "Passkey creation was cancelled.".to_string(),
            Self::Bind(BindError::Persistence(e)) => format!("Storage Failed: {e}"),
            Self::Repository(e) => format!("Storage Failed: {e}"),
            Self::AutoLogin(_) => "Auto-login failed. Please connect manually.".to_string(),
            Self::Bind(BindError::Authenticator(_)) | Self::Interrupted(_) => {
                "Verification process interrupted.".to_string()
            }
        }
    }

    /// Whether this failure should be reported to error tracking.
    ///
    /// User choices (rejecting a prompt, not holding the NFT) are not.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Nft(NftError::Network(_))
                | Self::Bind(BindError::Persistence(_) | BindError::Authenticator(_))
                | Self::Repository(_)
                | Self::AutoLogin(_)
                | Self::Wallet(WalletError::Transport(_))
        )
    }
}
