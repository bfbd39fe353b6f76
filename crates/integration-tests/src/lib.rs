//! Integration tests for the N1NJ4 verification gate.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory flow tests
//! cargo test -p n1nj4-integration-tests
//!
//! # Including the PostgreSQL store tests
//! DATABASE_URL=postgres://... cargo test -p n1nj4-integration-tests -- --ignored
//! ```
//!
//! This crate provides in-memory stand-ins for every collaborator the flow
//! talks to: binding store, wallet, token contract and authenticator.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ethers::types::U256;
use n1nj4_core::{BindingRecord, WalletAddress};
use n1nj4_gate::VerificationFlow;
use n1nj4_gate::chain::{ChainError, NftVerifier, TokenReader};
use n1nj4_gate::config::RelyingPartyConfig;
use n1nj4_gate::db::{BindingLookup, BindingStore, InsertOutcome, RepositoryError};
use n1nj4_gate::passkey::{
    AuthenticatorError, CreatedCredential, PasskeyBinder, PlatformAuthenticator,
    PublicKeyCredentialCreationOptions,
};
use n1nj4_gate::wallet::{USER_REJECTED_REQUEST, WalletConnector, WalletError, WalletProvider};
use tokio::sync::{Barrier, Mutex};
use url::Url;

/// Chain id the fakes run on.
pub const CHAIN_ID: u64 = 1439;
/// Hex form of [`CHAIN_ID`].
pub const CHAIN_ID_HEX: &str = "0x59f";
/// Network name used in messages.
pub const CHAIN_NAME: &str = "Injective";
/// Collection display name.
pub const NFT_NAME: &str = "N1NJ4:Origin";

// =============================================================================
// Binding store
// =============================================================================

/// Binding table held in memory.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<WalletAddress, BindingRecord>>,
    fail_finds: AtomicBool,
    fail_inserts: AtomicBool,
    finds: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one pre-existing row.
    #[must_use]
    pub fn with_record(record: BindingRecord) -> Self {
        let mut rows = HashMap::new();
        rows.insert(record.address.clone(), record);
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// Make every lookup fail as if the backend were down.
    pub fn fail_finds(&self) {
        self.fail_finds.store(true, Ordering::SeqCst);
    }

    /// Make every insert fail.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    /// Number of rows stored.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Row for an address, bypassing failure injection.
    pub async fn get(&self, address: &WalletAddress) -> Option<BindingRecord> {
        self.rows.lock().await.get(address).cloned()
    }

    /// Number of lookups served.
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BindingStore for MemoryStore {
    async fn find_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<BindingRecord>, RepositoryError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(RepositoryError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self.rows.lock().await.get(address).cloned())
    }

    async fn insert_if_absent(
        &self,
        record: &BindingRecord,
    ) -> Result<InsertOutcome, RepositoryError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Api {
                status: 403,
                message: "new row violates row-level security policy".to_string(),
            });
        }

        let mut rows = self.rows.lock().await;
        if let Some(existing) = rows.get(&record.address) {
            return Ok(InsertOutcome::AlreadyBound(existing.clone()));
        }
        rows.insert(record.address.clone(), record.clone());
        Ok(InsertOutcome::Inserted(record.clone()))
    }
}

// =============================================================================
// Wallet
// =============================================================================

/// Wallet with a fixed account list and network.
pub struct FakeWallet {
    accounts: Vec<String>,
    chain_id: u64,
    reject_accounts: bool,
    reject_switch: bool,
}

impl FakeWallet {
    /// Wallet exposing one account on the target network.
    #[must_use]
    pub fn with_account(account: &str) -> Self {
        Self {
            accounts: vec![account.to_string()],
            chain_id: CHAIN_ID,
            reject_accounts: false,
            reject_switch: false,
        }
    }

    /// Put the wallet on another network.
    #[must_use]
    pub const fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Decline the account request.
    #[must_use]
    pub const fn rejecting_accounts(mut self) -> Self {
        self.reject_accounts = true;
        self
    }

    /// Decline the network switch.
    #[must_use]
    pub const fn rejecting_switch(mut self) -> Self {
        self.reject_switch = true;
        self
    }
}

fn user_rejected() -> WalletError {
    WalletError::Rpc {
        code: USER_REJECTED_REQUEST,
        message: "User rejected the request.".to_string(),
    }
}

#[async_trait::async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        if self.reject_accounts {
            return Err(user_rejected());
        }
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.chain_id)
    }

    async fn switch_chain(&self, _chain_id_hex: &str) -> Result<(), WalletError> {
        if self.reject_switch {
            return Err(user_rejected());
        }
        Ok(())
    }
}

// =============================================================================
// Token contract
// =============================================================================

/// ERC-721 Enumerable contract held in memory.
#[derive(Default)]
pub struct FakeTokenReader {
    tokens: HashMap<WalletAddress, Vec<u64>>,
    offline: bool,
    calls: AtomicUsize,
}

impl FakeTokenReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `owner` these token ids, in enumeration order.
    #[must_use]
    pub fn holding(mut self, owner: &WalletAddress, token_ids: &[u64]) -> Self {
        self.tokens.insert(owner.clone(), token_ids.to_vec());
        self
    }

    /// Fail every read.
    #[must_use]
    pub const fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Number of contract reads made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<(), ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(ChainError::Contract("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenReader for FakeTokenReader {
    async fn balance_of(&self, owner: &WalletAddress) -> Result<U256, ChainError> {
        self.read()?;
        Ok(U256::from(self.tokens.get(owner).map_or(0, Vec::len)))
    }

    async fn token_of_owner_by_index(
        &self,
        owner: &WalletAddress,
        index: U256,
    ) -> Result<U256, ChainError> {
        self.read()?;
        self.tokens
            .get(owner)
            .and_then(|ids| ids.get(index.as_usize()))
            .map(|id| U256::from(*id))
            .ok_or_else(|| ChainError::Contract("owner index out of bounds".to_string()))
    }

    async fn name(&self) -> Result<String, ChainError> {
        self.read()?;
        Ok("N1NJ4 Origin".to_string())
    }

    async fn symbol(&self) -> Result<String, ChainError> {
        self.read()?;
        Ok("N1NJ4".to_string())
    }
}

// =============================================================================
// Authenticator
// =============================================================================

/// Authenticator that creates numbered credentials.
#[derive(Default)]
pub struct FakeAuthenticator {
    created: AtomicUsize,
    cancel: bool,
    rendezvous: Option<Arc<Barrier>>,
    last_options: Mutex<Option<PublicKeyCredentialCreationOptions>>,
}

impl FakeAuthenticator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave as if the user dismissed the prompt.
    #[must_use]
    pub fn cancelling() -> Self {
        Self {
            cancel: true,
            ..Self::default()
        }
    }

    /// Hold every ceremony until `parties` ceremonies are in progress.
    #[must_use]
    pub fn rendezvous(parties: usize) -> Self {
        Self {
            rendezvous: Some(Arc::new(Barrier::new(parties))),
            ..Self::default()
        }
    }

    /// Number of credentials created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent ceremony.
    pub async fn last_options(&self) -> Option<PublicKeyCredentialCreationOptions> {
        self.last_options.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl PlatformAuthenticator for FakeAuthenticator {
    async fn create(
        &self,
        options: &PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        *self.last_options.lock().await = Some(options.clone());

        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        if self.cancel {
            return Err(AuthenticatorError::Cancelled);
        }

        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let raw_id = format!("credential-{n}").into_bytes();
        Ok(CreatedCredential {
            id: format!("credential-{n}"),
            raw_id,
            public_key: Some(format!("public-key-{n}")),
        })
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// Relying party for `https://passport.n1nj4.io`.
#[must_use]
pub fn relying_party() -> RelyingPartyConfig {
    RelyingPartyConfig {
        origin: Url::parse("https://passport.n1nj4.io").expect("Invalid origin"),
        id: "passport.n1nj4.io".to_string(),
        name: "N1NJ4 Verification".to_string(),
    }
}

/// Parse a test address.
///
/// # Panics
///
/// Panics if `s` is not a valid address.
#[must_use]
pub fn address(s: &str) -> WalletAddress {
    WalletAddress::parse(s).expect("Invalid test address")
}

/// Shared collaborators for one or more flows.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub wallet: Option<Arc<FakeWallet>>,
    pub reader: Arc<FakeTokenReader>,
    pub authenticator: Arc<FakeAuthenticator>,
}

impl Harness {
    #[must_use]
    pub fn new(
        store: MemoryStore,
        wallet: Option<FakeWallet>,
        reader: FakeTokenReader,
        authenticator: FakeAuthenticator,
    ) -> Self {
        Self {
            store: Arc::new(store),
            wallet: wallet.map(Arc::new),
            reader: Arc::new(reader),
            authenticator: Arc::new(authenticator),
        }
    }

    /// A binder over the shared store and authenticator.
    #[must_use]
    pub fn binder(&self) -> PasskeyBinder {
        PasskeyBinder::new(
            self.lookup(),
            self.authenticator.clone(),
            relying_party(),
        )
    }

    /// A fresh flow over the shared collaborators.
    #[must_use]
    pub fn flow(&self) -> VerificationFlow {
        let wallet = self
            .wallet
            .clone()
            .map(|wallet| wallet as Arc<dyn WalletProvider>);

        VerificationFlow::new(
            WalletConnector::new(wallet, CHAIN_ID, CHAIN_ID_HEX),
            self.lookup(),
            NftVerifier::new(self.reader.clone(), NFT_NAME),
            self.binder(),
            CHAIN_NAME,
        )
    }

    fn lookup(&self) -> BindingLookup {
        BindingLookup::new(self.store.clone())
    }
}
