//! EIP-1193 provider reached over HTTP JSON-RPC.
//!
//! Desktop wallets expose the same request interface a browser extension
//! injects; this client speaks it through an ethers HTTP transport so the
//! gate can run outside a browser.

use ethers::providers::{Http, Provider};
use ethers::types::U64;
use serde::Serialize;
use url::Url;

use super::{WalletError, WalletProvider};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParams<'a> {
    chain_id: &'a str,
}

/// Wallet provider speaking EIP-1193 over HTTP.
pub struct Eip1193Provider {
    provider: Provider<Http>,
}

impl Eip1193Provider {
    /// Create a provider for a wallet RPC endpoint.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Transport` if the endpoint is not usable.
    pub fn new(endpoint: &Url) -> Result<Self, WalletError> {
        let provider = Provider::<Http>::try_from(endpoint.as_str())
            .map_err(|e| WalletError::Transport(format!("{endpoint}: {e}")))?;

        Ok(Self { provider })
    }
}

#[async_trait::async_trait]
impl WalletProvider for Eip1193Provider {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        tracing::debug!("Wallet RPC eth_requestAccounts");
        Ok(self.provider.request("eth_requestAccounts", ()).await?)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let id: U64 = self.provider.request("eth_chainId", ()).await?;
        Ok(id.as_u64())
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), WalletError> {
        tracing::debug!(chain_id = chain_id_hex, "Wallet RPC wallet_switchEthereumChain");
        let params = [SwitchChainParams {
            chain_id: chain_id_hex,
        }];
        let _: serde_json::Value = self
            .provider
            .request("wallet_switchEthereumChain", params)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::wallet::USER_REJECTED_REQUEST;

    async fn answer(server: &MockServer, rpc_method: &str, reply: serde_json::Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(server)
            .await;
    }

    fn provider(server: &MockServer) -> Eip1193Provider {
        Eip1193Provider::new(&Url::parse(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_request_accounts() {
        let server = MockServer::start().await;
        answer(
            &server,
            "eth_requestAccounts",
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": ["0xAbC0000000000000000000000000000000000123"]
            }),
        )
        .await;

        let accounts = provider(&server).request_accounts().await.unwrap();
        assert_eq!(accounts, vec!["0xAbC0000000000000000000000000000000000123"]);
    }

    #[tokio::test]
    async fn test_user_rejection_maps_to_rpc_error() {
        let server = MockServer::start().await;
        answer(
            &server,
            "eth_requestAccounts",
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 4001, "message": "User rejected the request." }
            }),
        )
        .await;

        let error = provider(&server).request_accounts().await.unwrap_err();
        assert!(error.is_user_rejection());
        assert!(matches!(
            error,
            WalletError::Rpc { code: USER_REJECTED_REQUEST, ref message }
                if message == "User rejected the request."
        ));
    }

    #[tokio::test]
    async fn test_chain_id_quantity() {
        let server = MockServer::start().await;
        answer(
            &server,
            "eth_chainId",
            json!({ "jsonrpc": "2.0", "id": 1, "result": "0x59f" }),
        )
        .await;

        assert_eq!(provider(&server).chain_id().await.unwrap(), 1439);
    }

    #[tokio::test]
    async fn test_switch_chain_sends_hex_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "wallet_switchEthereumChain",
                "params": [{ "chainId": "0x59f" }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": null })),
            )
            .expect(1)
            .mount(&server)
            .await;

        provider(&server).switch_chain("0x59f").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_rpc_reply_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let error = provider(&server).chain_id().await.unwrap_err();
        assert!(matches!(error, WalletError::Transport(_)));
        assert!(!error.is_user_rejection());
    }
}
