//! N1NJ4 Core - Shared types library.
//!
//! This crate provides the types shared by every part of the passport gate:
//! - `gate` - Verification flow, wallet/chain/store/authenticator adapters
//! - `cli` - Command-line driver that renders the flow
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Wallet addresses, binding records, NFT data and flow steps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
