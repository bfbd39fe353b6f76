//! NFT ownership checks against an ERC-721 Enumerable contract.

mod erc721;

pub use erc721::Erc721Reader;

use std::sync::Arc;

use ethers::types::U256;
use n1nj4_core::{NftData, WalletAddress};
use thiserror::Error;

/// Errors from the contract read layer.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The JSON-RPC provider could not be built.
    #[error("provider error: {0}")]
    Provider(String),

    /// An address could not be converted for the call.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A contract call failed (transport, revert, or decoding).
    #[error("contract call failed: {0}")]
    Contract(String),
}

/// Errors from [`NftVerifier::verify`].
#[derive(Debug, Error)]
pub enum NftError {
    /// The address holds no token of the collection.
    #[error("no token held")]
    NotFound,

    /// The chain could not be read.
    #[error("network error: {0}")]
    Network(#[from] ChainError),
}

/// Read-only view of an ERC-721 Enumerable contract.
#[async_trait::async_trait]
pub trait TokenReader: Send + Sync {
    /// `balanceOf(owner)`.
    async fn balance_of(&self, owner: &WalletAddress) -> Result<U256, ChainError>;

    /// `tokenOfOwnerByIndex(owner, index)`.
    async fn token_of_owner_by_index(
        &self,
        owner: &WalletAddress,
        index: U256,
    ) -> Result<U256, ChainError>;

    /// `name()`.
    async fn name(&self) -> Result<String, ChainError>;

    /// `symbol()`.
    async fn symbol(&self) -> Result<String, ChainError>;
}

/// On-chain collection metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub symbol: String,
}

/// Checks that an address owns a token of the configured collection.
#[derive(Clone)]
pub struct NftVerifier {
    reader: Arc<dyn TokenReader>,
    display_name: String,
}

impl NftVerifier {
    /// Create a verifier. `display_name` is what [`NftData::name`] reports.
    #[must_use]
    pub fn new(reader: Arc<dyn TokenReader>, display_name: impl Into<String>) -> Self {
        Self {
            reader,
            display_name: display_name.into(),
        }
    }

    /// The configured collection display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Return the first token owned by `address`.
    ///
    /// Only index 0 is read; holders of several tokens are identified by
    /// whichever the contract enumerates first.
    ///
    /// # Errors
    ///
    /// Returns `NftError::NotFound` if the balance is zero.
    /// Returns `NftError::Network` if any contract read fails.
    #[tracing::instrument(skip(self), fields(address = %address))]
    pub async fn verify(&self, address: &WalletAddress) -> Result<NftData, NftError> {
        let balance = self.reader.balance_of(address).await?;
        tracing::debug!(%balance, "NFT balance");

        if balance.is_zero() {
            return Err(NftError::NotFound);
        }

        let token_id = self
            .reader
            .token_of_owner_by_index(address, U256::zero())
            .await?;

        tracing::info!(%token_id, "NFT ownership verified");
        Ok(NftData {
            token_id: token_id.to_string(),
            name: self.display_name.clone(),
        })
    }

    /// Read the collection's on-chain name and symbol.
    ///
    /// # Errors
    ///
    /// Returns `ChainError` if either read fails.
    pub async fn collection_info(&self) -> Result<CollectionInfo, ChainError> {
        let name = self.reader.name().await?;
        let symbol = self.reader.symbol().await?;
        Ok(CollectionInfo { name, symbol })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const HOLDER: &str = "0xabc0000000000000000000000000000000000123";

    struct FakeReader {
        balance: u64,
        token_id: u64,
        fail: bool,
        index_reads: AtomicUsize,
    }

    impl FakeReader {
        fn new(balance: u64, token_id: u64) -> Self {
            Self {
                balance,
                token_id,
                fail: false,
                index_reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl TokenReader for FakeReader {
        async fn balance_of(&self, _owner: &WalletAddress) -> Result<U256, ChainError> {
            if self.fail {
                return Err(ChainError::Contract("connection refused".to_string()));
            }
            Ok(U256::from(self.balance))
        }

        async fn token_of_owner_by_index(
            &self,
            _owner: &WalletAddress,
            index: U256,
        ) -> Result<U256, ChainError> {
            assert!(index.is_zero());
            self.index_reads.fetch_add(1, Ordering::SeqCst);
            Ok(U256::from(self.token_id))
        }

        async fn name(&self) -> Result<String, ChainError> {
            Ok("N1NJ4 Origin".to_string())
        }

        async fn symbol(&self) -> Result<String, ChainError> {
            Ok("N1NJ4".to_string())
        }
    }

    fn holder() -> WalletAddress {
        WalletAddress::parse(HOLDER).unwrap()
    }

    #[tokio::test]
    async fn test_verify_returns_first_token() {
        let verifier = NftVerifier::new(Arc::new(FakeReader::new(3, 42)), "N1NJ4:Origin");

        let nft = verifier.verify(&holder()).await.unwrap();
        assert_eq!(nft.token_id, "42");
        assert_eq!(nft.name, "N1NJ4:Origin");
    }

    #[tokio::test]
    async fn test_verify_zero_balance() {
        let reader = Arc::new(FakeReader::new(0, 42));
        let verifier = NftVerifier::new(reader.clone(), "N1NJ4:Origin");

        assert!(matches!(
            verifier.verify(&holder()).await,
            Err(NftError::NotFound)
        ));
        assert_eq!(reader.index_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_network_failure() {
        let mut reader = FakeReader::new(1, 42);
        reader.fail = true;
        let verifier = NftVerifier::new(Arc::new(reader), "N1NJ4:Origin");

        assert!(matches!(
            verifier.verify(&holder()).await,
            Err(NftError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_token_id_larger_than_u64() {
        struct BigReader;

        #[async_trait::async_trait]
        impl TokenReader for BigReader {
            async fn balance_of(&self, _owner: &WalletAddress) -> Result<U256, ChainError> {
                Ok(U256::one())
            }
            async fn token_of_owner_by_index(
                &self,
                _owner: &WalletAddress,
                _index: U256,
            ) -> Result<U256, ChainError> {
                Ok(U256::MAX)
            }
            async fn name(&self) -> Result<String, ChainError> {
                Ok(String::new())
            }
            async fn symbol(&self) -> Result<String, ChainError> {
                Ok(String::new())
            }
        }

        let verifier = NftVerifier::new(Arc::new(BigReader), "N1NJ4:Origin");
        let nft = verifier.verify(&holder()).await.unwrap();
        assert_eq!(nft.token_id, U256::MAX.to_string());
    }

    #[tokio::test]
    async fn test_collection_info() {
        let verifier = NftVerifier::new(Arc::new(FakeReader::new(0, 0)), "N1NJ4:Origin");
        let info = verifier.collection_info().await.unwrap();
        assert_eq!(info.name, "N1NJ4 Origin");
        assert_eq!(info.symbol, "N1NJ4");
    }
}
