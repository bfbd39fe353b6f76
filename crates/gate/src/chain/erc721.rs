//! ERC-721 Enumerable reads over an ethers JSON-RPC provider.

use std::sync::Arc;

use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use n1nj4_core::WalletAddress;
use url::Url;

use super::{ChainError, TokenReader};

#[allow(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
mod bindings {
    ethers::contract::abigen!(
        Erc721Enumerable,
        r"[
            function balanceOf(address owner) external view returns (uint256)
            function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256)
            function name() external view returns (string)
            function symbol() external view returns (string)
        ]"
    );
}

use bindings::Erc721Enumerable;

/// [`TokenReader`] backed by a live contract.
#[derive(Clone)]
pub struct Erc721Reader {
    contract: Erc721Enumerable<Provider<Http>>,
}

impl Erc721Reader {
    /// Connect to `contract` through the JSON-RPC endpoint at `rpc_url`.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Provider` if the provider cannot be built.
    pub fn new(rpc_url: &Url, contract: &WalletAddress) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| ChainError::Provider(e.to_string()))?;
        let address = to_address(contract)?;

        Ok(Self {
            contract: Erc721Enumerable::new(address, Arc::new(provider)),
        })
    }
}

fn to_address(address: &WalletAddress) -> Result<Address, ChainError> {
    address
        .as_str()
        .parse::<Address>()
        .map_err(|e| ChainError::InvalidAddress(format!("{address}: {e}")))
}

#[async_trait::async_trait]
impl TokenReader for Erc721Reader {
    async fn balance_of(&self, owner: &WalletAddress) -> Result<U256, ChainError> {
        let owner = to_address(owner)?;
        self.contract
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn token_of_owner_by_index(
        &self,
        owner: &WalletAddress,
        index: U256,
    ) -> Result<U256, ChainError> {
        let owner = to_address(owner)?;
        self.contract
            .token_of_owner_by_index(owner, index)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn name(&self) -> Result<String, ChainError> {
        self.contract
            .name()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn symbol(&self) -> Result<String, ChainError> {
        self.contract
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }
}
