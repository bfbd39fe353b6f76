//! Verification flow controller.
//!
//! One [`VerificationFlow`] drives one user session through
//! `connect -> nft -> verified`. Transitions take `&mut self`, so a session
//! cannot run two at once. A failed transition keeps the current step and
//! records a user-facing message in [`FlowState::error`].
//!
//! Intermediate states (loading texts between sub-steps) are only visible
//! through an observer registered with [`VerificationFlow::on_change`]; by
//! the time a transition returns, loading has been cleared.

use std::sync::Arc;

use n1nj4_core::{AppStep, BindingRecord, NftData, WalletAddress};

use crate::chain::{ChainError, Erc721Reader, NftVerifier};
use crate::config::GateConfig;
use crate::db::{BindingLookup, BindingStore};
use crate::error::FlowError;
use crate::passkey::{PasskeyBinder, PlatformAuthenticator};
use crate::slogans::loading;
use crate::wallet::{Handover, WalletConnector, WalletProvider};

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowState {
    pub step: AppStep,
    pub loading: bool,
    pub loading_text: Option<&'static str>,
    pub address: Option<WalletAddress>,
    pub nft: Option<NftData>,
    pub record: Option<BindingRecord>,
    pub error: Option<String>,
}

/// Callback invoked with every published [`FlowState`].
pub type StateObserver = Arc<dyn Fn(&FlowState) + Send + Sync>;

/// Drives a single verification session.
pub struct VerificationFlow {
    state: FlowState,
    observer: Option<StateObserver>,
    wallet: WalletConnector,
    lookup: BindingLookup,
    verifier: NftVerifier,
    binder: PasskeyBinder,
    chain_name: String,
}

impl VerificationFlow {
    /// Assemble a flow from its collaborators. Starts at [`AppStep::Connect`].
    #[must_use]
    pub fn new(
        wallet: WalletConnector,
        lookup: BindingLookup,
        verifier: NftVerifier,
        binder: PasskeyBinder,
        chain_name: impl Into<String>,
    ) -> Self {
        Self {
            state: FlowState::default(),
            observer: None,
            wallet,
            lookup,
            verifier,
            binder,
            chain_name: chain_name.into(),
        }
    }

    /// Assemble a flow against live endpoints.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Provider` if the contract reader cannot be built.
    pub fn from_config(
        config: &GateConfig,
        store: Arc<dyn BindingStore>,
        wallet: Option<Arc<dyn WalletProvider>>,
        authenticator: Arc<dyn PlatformAuthenticator>,
    ) -> Result<Self, ChainError> {
        let reader = Erc721Reader::new(&config.chain.rpc_url, &config.nft.contract_address)?;
        let lookup = BindingLookup::new(store);

        Ok(Self::new(
            WalletConnector::new(wallet, config.chain.id, config.chain.id_hex.clone()),
            lookup.clone(),
            NftVerifier::new(Arc::new(reader), config.nft.display_name.clone()),
            PasskeyBinder::new(lookup, authenticator, config.relying_party.clone()),
            config.chain.name.clone(),
        ))
    }

    /// Publish every state change to `observer`, synchronously and in order.
    pub fn on_change(&mut self, observer: impl Fn(&FlowState) + Send + Sync + 'static) {
        self.observer = Some(Arc::new(observer));
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> AppStep {
        self.state.step
    }

    /// Clear the displayed error.
    pub fn dismiss_error(&mut self) {
        if self.state.error.take().is_some() {
            self.publish();
        }
    }

    /// Enter the flow with a handed-over address instead of a wallet.
    ///
    /// The signature is not verified.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::AutoLogin` if the handed-over address is unusable,
    /// and NFT errors as [`VerificationFlow::connect_wallet`] does.
    #[tracing::instrument(skip_all, fields(address = handover.address()))]
    pub async fn auto_login(&mut self, handover: &Handover) -> Result<AppStep, FlowError> {
        self.require_step(AppStep::Connect)?;
        tracing::warn!("Handover login accepted without signature verification");

        self.begin(loading::SEARCHING);
        let result = match WalletAddress::parse(handover.address()) {
            Ok(address) => {
                self.state.address = Some(address.clone());
                self.check_existing_binding(&address).await
            }
            Err(e) => Err(FlowError::AutoLogin(e.to_string())),
        };
        self.settle(result)
    }

    /// Connect the wallet, then route by binding and NFT ownership.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Wallet` if the wallet cannot be connected and
    /// `FlowError::Nft` if ownership cannot be confirmed.
    #[tracing::instrument(skip_all)]
    pub async fn connect_wallet(&mut self) -> Result<AppStep, FlowError> {
        self.require_step(AppStep::Connect)?;

        self.begin(loading::CONNECTING);
        let result = match self.wallet.connect().await {
            Ok(address) => {
                self.state.address = Some(address.clone());
                self.check_existing_binding(&address).await
            }
            Err(e) => Err(e.into()),
        };
        self.settle(result)
    }

    /// Create a passkey and bind it to the connected address.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Interrupted` outside the `nft` step,
    /// `FlowError::Bind` if the passkey or the store fails.
    #[tracing::instrument(skip_all)]
    pub async fn bind_passkey(&mut self) -> Result<AppStep, FlowError> {
        self.require_step(AppStep::Nft)?;
        let Some(address) = self.state.address.clone() else {
            let e = FlowError::Interrupted("no connected address".to_string());
            return Err(self.fail(e));
        };

        self.begin(loading::SEARCHING);
        let result = self.bind(&address).await;
        self.settle(result)
    }

    async fn bind(&mut self, address: &WalletAddress) -> Result<(), FlowError> {
        if let Some(existing) = self.binder.find_existing(address).await {
            self.verified(existing);
            return Ok(());
        }

        self.set_loading_text(loading::CREATING_PASSKEY);
        let credential = self.binder.create_credential(address).await?;

        self.set_loading_text(loading::BINDING);
        let outcome = self.binder.persist(address, credential).await?;

        self.verified(outcome.into_record());
        Ok(())
    }

    async fn check_existing_binding(&mut self, address: &WalletAddress) -> Result<(), FlowError> {
        self.set_loading_text(loading::SEARCHING);

        if let Some(record) = self.lookup.find(address).await {
            tracing::info!("Existing binding found");
            self.verified(record);
            return Ok(());
        }

        self.check_nft(address).await
    }

    async fn check_nft(&mut self, address: &WalletAddress) -> Result<(), FlowError> {
        self.set_loading_text(loading::VERIFYING);

        let nft = self.verifier.verify(address).await?;
        self.state.nft = Some(nft);
        self.transition(AppStep::Nft);
        Ok(())
    }

    fn verified(&mut self, record: BindingRecord) {
        self.state.record = Some(record);
        self.transition(AppStep::Verified);
    }

    fn transition(&mut self, step: AppStep) {
        tracing::info!(from = %self.state.step, to = %step, "Step changed");
        self.state.step = step;
    }

    fn require_step(&mut self, expected: AppStep) -> Result<(), FlowError> {
        let current = self.state.step;
        if current == expected {
            return Ok(());
        }
        let e = if current.is_terminal() {
            FlowError::Interrupted("session is already verified".to_string())
        } else {
            FlowError::Interrupted(format!("expected step {expected}, session is at {current}"))
        };
        Err(self.fail(e))
    }

    fn begin(&mut self, text: &'static str) {
        self.state.loading = true;
        self.state.error = None;
        self.set_loading_text(text);
    }

    fn set_loading_text(&mut self, text: &'static str) {
        if self.state.loading_text == Some(text) {
            return;
        }
        tracing::debug!(text, "Loading");
        self.state.loading_text = Some(text);
        self.publish();
    }

    fn settle(&mut self, result: Result<(), FlowError>) -> Result<AppStep, FlowError> {
        self.state.loading = false;
        self.state.loading_text = None;

        match result {
            Ok(()) => {
                self.publish();
                Ok(self.state.step)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn publish(&self) {
        if let Some(observer) = &self.observer {
            observer(&self.state);
        }
    }

    fn fail(&mut self, e: FlowError) -> FlowError {
        let message = e.user_message(&self.chain_name, self.verifier.display_name());

        if e.is_reportable() {
            tracing::error!(error = %e, step = %self.state.step, "Verification step failed");
        } else {
            tracing::warn!(error = %e, step = %self.state.step, "Verification step failed");
        }

        self.state.error = Some(message);
        self.publish();
        e
    }
}
