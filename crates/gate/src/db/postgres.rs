//! Direct `PostgreSQL` binding store.

use std::time::Duration;

use n1nj4_core::{BindingRecord, WalletAddress};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{BindingRow, BindingStore, InsertOutcome, RepositoryError};

const COLUMNS: &str = r#"address, passkey_id, credential_id, public_key, "timestamp", tx_hash"#;

/// Binding store over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgBindingStore {
    pool: PgPool,
    find_sql: String,
    insert_sql: String,
}

impl PgBindingStore {
    /// Create a store over an existing pool.
    ///
    /// `table` must already be validated as a plain SQL identifier; it is
    /// interpolated into the statements.
    #[must_use]
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            find_sql: format!("SELECT {COLUMNS} FROM {table} WHERE address = $1"),
            insert_sql: format!(
                "INSERT INTO {table} ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (address) DO NOTHING RETURNING {COLUMNS}"
            ),
        }
    }

    /// Connect to `PostgreSQL` and create a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the connection cannot be
    /// established.
    pub async fn connect(database_url: &SecretString, table: &str) -> Result<Self, RepositoryError> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool, table))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[async_trait::async_trait]
impl BindingStore for PgBindingStore {
    #[tracing::instrument(skip(self), fields(address = %address))]
    async fn find_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<BindingRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, BindingRow>(&self.find_sql)
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(BindingRecord::from))
    }

    #[tracing::instrument(skip(self, record), fields(address = %record.address))]
    async fn insert_if_absent(
        &self,
        record: &BindingRecord,
    ) -> Result<InsertOutcome, RepositoryError> {
        let inserted = sqlx::query_as::<_, BindingRow>(&self.insert_sql)
            .bind(&record.address)
            .bind(&record.passkey_id)
            .bind(record.credential_id.as_deref())
            .bind(record.public_key.as_deref())
            .bind(record.timestamp)
            .bind(&record.tx_hash)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(InsertOutcome::Inserted(row.into()));
        }

        match self.find_by_address(&record.address).await? {
            Some(existing) => Ok(InsertOutcome::AlreadyBound(existing)),
            None => Err(RepositoryError::Conflict(format!(
                "insert for {} was skipped but no row exists",
                record.address
            ))),
        }
    }
}
