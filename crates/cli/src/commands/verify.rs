//! Interactive verification flow.
//!
//! # Usage
//!
//! ```bash
//! n1nj4 verify [--yes]
//! n1nj4 verify --handover-url "https://passport.n1nj4.io/?address=0x...&sig=0x..."
//! n1nj4 verify --address 0x... --sig 0x...
//! ```
//!
//! When the flow reaches the passkey step, the creation options are printed
//! as one line of JSON. Feed them to
//! `navigator.credentials.create({ publicKey: PublicKeyCredential.parseCreationOptionsFromJSON(options) })`
//! on the relying party origin and paste `credential.toJSON()` back as one
//! line. An empty line cancels.

use std::io::BufRead;
use std::sync::Arc;

use n1nj4_core::AppStep;
use n1nj4_gate::db;
use n1nj4_gate::passkey::HandoffAuthenticator;
use n1nj4_gate::wallet::{Eip1193Provider, Handover, WalletProvider};
use n1nj4_gate::{GateConfig, VerificationFlow};
use url::Url;

use super::CliError;
use crate::render;

/// Build the optional handover from command-line arguments.
///
/// # Errors
///
/// Returns `CliError::IncompleteHandover` if a handover URL lacks either
/// parameter or an argument is empty.
pub fn handover_from_args(
    url: Option<Url>,
    address: Option<String>,
    sig: Option<String>,
) -> Result<Option<Handover>, CliError> {
    match (url, address, sig) {
        (Some(url), _, _) => Handover::from_url(&url)
            .map(Some)
            .ok_or(CliError::IncompleteHandover),
        (None, Some(address), Some(sig)) => Handover::new(address, sig)
            .map(Some)
            .ok_or(CliError::IncompleteHandover),
        (None, None, None) => Ok(None),
        _ => Err(CliError::IncompleteHandover),
    }
}

/// Run one verification session.
///
/// # Errors
///
/// Returns error if the store or wallet cannot be set up, or if a flow
/// transition fails. The user-facing message is rendered first.
pub async fn run(
    config: &GateConfig,
    handover: Option<Handover>,
    assume_yes: bool,
) -> Result<(), CliError> {
    let store = db::open_store(&config.store, &config.table_name).await?;

    let wallet = match &config.wallet_provider_url {
        Some(url) => {
            let provider: Arc<dyn WalletProvider> = Arc::new(Eip1193Provider::new(url)?);
            Some(provider)
        }
        None => None,
    };

    let authenticator = Arc::new(HandoffAuthenticator::stdio());
    let mut flow = VerificationFlow::from_config(config, store, wallet, authenticator)?;
    flow.on_change(render::progress);

    render::banner();

    let entered = match &handover {
        Some(handover) => flow.auto_login(handover).await,
        None => flow.connect_wallet().await,
    };
    render::state(flow.state(), config);
    entered?;

    if flow.step() == AppStep::Nft {
        if !assume_yes && !confirm_bind()? {
            tracing::info!("Bind declined");
            return Ok(());
        }

        render::handoff_instructions(&config.relying_party.origin);
        let bound = flow.bind_passkey().await;
        render::state(flow.state(), config);
        bound?;
    }

    Ok(())
}

fn confirm_bind() -> Result<bool, CliError> {
    render::prompt(&format!("{}? [y/N] ", n1nj4_gate::slogans::BIND_BTN))?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_handover() {
        assert!(handover_from_args(None, None, None).unwrap().is_none());
    }

    #[test]
    fn test_handover_from_url() {
        let url = Url::parse("https://passport.n1nj4.io/?address=0xabc&sig=0x01").unwrap();
        let handover = handover_from_args(Some(url), None, None).unwrap().unwrap();
        assert_eq!(handover.address(), "0xabc");
    }

    #[test]
    fn test_handover_url_without_sig() {
        let url = Url::parse("https://passport.n1nj4.io/?address=0xabc").unwrap();
        assert!(matches!(
            handover_from_args(Some(url), None, None),
            Err(CliError::IncompleteHandover)
        ));
    }

    #[test]
    fn test_handover_from_flags() {
        let handover =
            handover_from_args(None, Some("0xabc".to_string()), Some("0x01".to_string()))
                .unwrap()
                .unwrap();
        assert_eq!(handover.signature(), "0x01");
    }
}
