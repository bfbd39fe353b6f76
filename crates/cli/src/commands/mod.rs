//! Subcommand implementations.

pub mod inspect;
pub mod migrate;
pub mod verify;

use n1nj4_core::AddressError;
use n1nj4_gate::FlowError;
use n1nj4_gate::chain::ChainError;
use n1nj4_gate::db::RepositoryError;
use n1nj4_gate::wallet::WalletError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("Handover requires both an address and a signature")]
    IncompleteHandover,

    #[error("Binding store error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Verification failed: {0}")]
    Flow(#[from] FlowError),

    #[error("Migrations need DATABASE_URL; the Supabase backend is managed in its dashboard")]
    NotPostgres,

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
