//! N1NJ4 verification gate.
//!
//! Proves a person holds an `N1NJ4:Origin` NFT and binds a platform passkey
//! to their wallet address:
//!
//! 1. Connect a wallet (or accept a handed-over address).
//! 2. If the address is already bound, the session is verified.
//! 3. Otherwise check NFT ownership on-chain.
//! 4. Create a passkey and store the address binding.
//!
//! The rendering layer lives elsewhere; this crate exposes the state machine
//! in [`flow`] and its collaborators behind traits.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod flow;
pub mod passkey;
pub mod slogans;
pub mod wallet;

pub use config::GateConfig;
pub use error::FlowError;
pub use flow::{FlowState, StateObserver, VerificationFlow};
