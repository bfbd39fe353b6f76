//! Wallet connection.
//!
//! The [`WalletConnector`] talks to an injected EIP-1193 provider: it asks
//! for account access, makes sure the wallet is on the configured network,
//! and hands back one normalized address. The [`Handover`] path skips the
//! wallet entirely and is unauthenticated.

mod eip1193;
mod handover;

pub use eip1193::Eip1193Provider;
pub use handover::Handover;

use std::sync::Arc;

use ethers::providers::{ProviderError, RpcError};
use n1nj4_core::{AddressError, WalletAddress};
use thiserror::Error;

/// EIP-1193 error code for a request the user rejected.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Errors that can occur while connecting a wallet.
#[derive(Debug, Error)]
pub enum WalletError {
    /// No provider is injected / configured.
    #[error("no wallet provider available")]
    ExtensionMissing,

    /// The user declined account access, or the wallet exposed no account.
    #[error("wallet connection rejected")]
    ConnectionRejected,

    /// The wallet is on another network and the switch was declined.
    #[error("wallet is on chain {actual}, expected {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// The wallet returned something that is not an address.
    #[error("wallet returned an invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The provider answered with a JSON-RPC error.
    #[error("wallet RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The provider was unreachable or its reply was unreadable.
    #[error("wallet transport error: {0}")]
    Transport(String),
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        match e.as_error_response() {
            Some(response) => Self::Rpc {
                code: response.code,
                message: response.message.clone(),
            },
            None => Self::Transport(e.to_string()),
        }
    }
}

impl WalletError {
    /// Whether the user dismissed the wallet prompt.
    #[must_use]
    pub const fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            Self::Rpc {
                code: USER_REJECTED_REQUEST,
                ..
            }
        )
    }
}

/// An injected wallet provider.
///
/// Mirrors the three EIP-1193 requests the connect step needs.
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`: may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `wallet_switchEthereumChain`: may prompt the user.
    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), WalletError>;
}

/// Connects a wallet and returns its normalized address.
#[derive(Clone)]
pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
    chain_id: u64,
    chain_id_hex: String,
}

impl WalletConnector {
    /// Create a connector targeting one network.
    ///
    /// `provider` is `None` when no wallet is available, which makes every
    /// connect attempt fail with [`WalletError::ExtensionMissing`].
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        chain_id: u64,
        chain_id_hex: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chain_id,
            chain_id_hex: chain_id_hex.into(),
        }
    }

    /// Request account access, ensure the target network, return the first
    /// account.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::ExtensionMissing` without a provider.
    /// Returns `WalletError::ConnectionRejected` if the user declines access.
    /// Returns `WalletError::NetworkMismatch` if the network switch fails.
    #[tracing::instrument(skip(self), fields(chain_id = self.chain_id))]
    pub async fn connect(&self) -> Result<WalletAddress, WalletError> {
        let provider = self.provider.as_ref().ok_or(WalletError::ExtensionMissing)?;

        let accounts = provider.request_accounts().await.map_err(|e| {
            if e.is_user_rejection() {
                WalletError::ConnectionRejected
            } else {
                e
            }
        })?;

        let current = provider.chain_id().await?;
        if current != self.chain_id {
            tracing::info!(
                current,
                target = %self.chain_id_hex,
                "Wallet on another network, requesting switch"
            );
            provider
                .switch_chain(&self.chain_id_hex)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Network switch failed");
                    WalletError::NetworkMismatch {
                        expected: self.chain_id,
                        actual: current,
                    }
                })?;
        }

        let first = accounts
            .into_iter()
            .next()
            .ok_or(WalletError::ConnectionRejected)?;
        let address = WalletAddress::parse(&first)?;

        tracing::info!(address = %address, "Wallet connected");
        Ok(address)
    }
}
