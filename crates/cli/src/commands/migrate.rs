//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! n1nj4 migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/gate/migrations/`. They create `passport_bindings`; with a custom
//! `DB_TABLE_NAME`, create the table yourself.

use n1nj4_gate::GateConfig;
use n1nj4_gate::config::StoreConfig;
use n1nj4_gate::db::{self, MIGRATOR};

use super::CliError;

/// Run binding store migrations.
///
/// # Errors
///
/// Returns `CliError::NotPostgres` when the Supabase backend is configured,
/// or a database/migration error.
pub async fn run(config: &GateConfig) -> Result<(), CliError> {
    let StoreConfig::Postgres { database_url } = &config.store else {
        return Err(CliError::NotPostgres);
    };

    if config.table_name != "passport_bindings" {
        tracing::warn!(
            table = %config.table_name,
            "Migrations create passport_bindings, not the configured table"
        );
    }

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
