//! Core types for the passport gate.
//!
//! This module provides type-safe wrappers for the domain concepts of the
//! verification flow.

pub mod address;
pub mod binding;
pub mod nft;
pub mod step;

pub use address::{AddressError, WalletAddress};
pub use binding::{BindingRecord, TxHash};
pub use nft::NftData;
pub use step::AppStep;
