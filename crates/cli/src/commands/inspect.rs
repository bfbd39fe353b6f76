//! Read-only operator commands.
//!
//! # Usage
//!
//! ```bash
//! n1nj4 lookup 0xabc...123
//! n1nj4 check-nft 0xabc...123
//! n1nj4 contract-info
//! ```

use std::sync::Arc;

use n1nj4_core::WalletAddress;
use n1nj4_gate::GateConfig;
use n1nj4_gate::chain::{Erc721Reader, NftError, NftVerifier};
use n1nj4_gate::db::{self, BindingLookup};

use super::CliError;
use crate::render;

fn verifier(config: &GateConfig) -> Result<NftVerifier, CliError> {
    let reader = Erc721Reader::new(&config.chain.rpc_url, &config.nft.contract_address)?;
    Ok(NftVerifier::new(
        Arc::new(reader),
        config.nft.display_name.clone(),
    ))
}

/// Print the binding stored for an address.
///
/// Unlike the flow, store errors are reported instead of read as "unbound".
///
/// # Errors
///
/// Returns error if the address is invalid or the store query fails.
pub async fn lookup(config: &GateConfig, address: &str) -> Result<(), CliError> {
    let address = WalletAddress::parse(address)?;
    let store = db::open_store(&config.store, &config.table_name).await?;

    match BindingLookup::new(store).find_strict(&address).await? {
        Some(record) => render::record(&record, config),
        None => render::line(&format!("{address} is not bound")),
    }
    Ok(())
}

/// Print the NFT held by an address.
///
/// # Errors
///
/// Returns error if the address is invalid or the chain cannot be read.
/// Not holding the NFT is reported, not an error.
pub async fn check_nft(config: &GateConfig, address: &str) -> Result<(), CliError> {
    let address = WalletAddress::parse(address)?;

    match verifier(config)?.verify(&address).await {
        Ok(nft) => render::nft(&nft),
        Err(NftError::NotFound) => render::line(&format!(
            "{address} holds no {}",
            config.nft.display_name
        )),
        Err(NftError::Network(e)) => return Err(e.into()),
    }
    Ok(())
}

/// Print the collection's on-chain name and symbol.
///
/// # Errors
///
/// Returns error if the chain cannot be read.
pub async fn contract_info(config: &GateConfig) -> Result<(), CliError> {
    let info = verifier(config)?.collection_info().await?;
    render::collection(&info, config);
    Ok(())
}
