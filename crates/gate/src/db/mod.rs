//! Binding persistence.
//!
//! # Table: `passport_bindings`
//!
//! One row per bound wallet address:
//!
//! | column          | type     | notes                          |
//! |-----------------|----------|--------------------------------|
//! | `address`       | text     | lower case, unique             |
//! | `passkey_id`    | text     | authenticator credential id    |
//! | `credential_id` | text     | raw id, base64                 |
//! | `public_key`    | text     | nullable                       |
//! | `timestamp`     | bigint   | epoch millis                   |
//! | `tx_hash`       | text     | placeholder, never on-chain    |
//!
//! Two backends implement [`BindingStore`]: Supabase's REST API and a direct
//! `PostgreSQL` connection. Both insert with "insert if absent" semantics so
//! two sessions binding the same address cannot both create a row.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/gate/migrations/` and run via:
//! ```bash
//! n1nj4 migrate
//! ```

mod postgres;
mod supabase;

pub use postgres::{PgBindingStore, create_pool};
pub use supabase::SupabaseBindingStore;

use std::sync::Arc;

use n1nj4_core::{BindingRecord, TxHash, WalletAddress};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::StoreConfig;

/// Migrations for the `PostgreSQL` backend.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur in a binding store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// REST API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A row for the address exists but could not be read back.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row failed to parse.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The store was configured with unusable settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call created the row.
    Inserted(BindingRecord),
    /// A row already existed; it is returned unchanged.
    AlreadyBound(BindingRecord),
}

/// Row-oriented binding table keyed by normalized address.
#[async_trait::async_trait]
pub trait BindingStore: Send + Sync {
    /// Point lookup by address.
    async fn find_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<BindingRecord>, RepositoryError>;

    /// Insert the record unless a row for its address already exists.
    ///
    /// Must be atomic with respect to concurrent inserts for one address.
    async fn insert_if_absent(
        &self,
        record: &BindingRecord,
    ) -> Result<InsertOutcome, RepositoryError>;
}

/// Open the store selected by configuration.
///
/// # Errors
///
/// Returns `RepositoryError` if the store cannot be created or, for
/// `PostgreSQL`, the connection cannot be established.
pub async fn open_store(
    config: &StoreConfig,
    table: &str,
) -> Result<Arc<dyn BindingStore>, RepositoryError> {
    tracing::info!(backend = config.backend_name(), table, "Opening binding store");

    match config {
        StoreConfig::Supabase { url, anon_key } => {
            Ok(Arc::new(SupabaseBindingStore::new(url, anon_key, table)?))
        }
        StoreConfig::Postgres { database_url } => {
            Ok(Arc::new(PgBindingStore::connect(database_url, table).await?))
        }
    }
}

/// Looks up existing bindings.
///
/// [`BindingLookup::find`] deliberately collapses store failures into "not
/// bound": an outage sends the user down the fresh-signup path instead of
/// blocking them. Use [`BindingLookup::find_strict`] when the difference
/// matters.
#[derive(Clone)]
pub struct BindingLookup {
    store: Arc<dyn BindingStore>,
}

impl BindingLookup {
    /// Create a lookup over a store.
    #[must_use]
    pub fn new(store: Arc<dyn BindingStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn BindingStore> {
        &self.store
    }

    /// Find the binding for an address; store errors read as `None`.
    #[tracing::instrument(skip(self), fields(address = %address))]
    pub async fn find(&self, address: &WalletAddress) -> Option<BindingRecord> {
        match self.store.find_by_address(address).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Binding lookup failed, treating as unbound");
                None
            }
        }
    }

    /// Find the binding for an address, surfacing store errors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store query fails.
    pub async fn find_strict(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<BindingRecord>, RepositoryError> {
        self.store.find_by_address(address).await
    }
}

/// Binding row as stored, with snake-case column names.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub(crate) struct BindingRow {
    pub address: WalletAddress,
    pub passkey_id: String,
    pub credential_id: Option<String>,
    pub public_key: Option<String>,
    #[serde(deserialize_with = "deserialize_millis")]
    pub timestamp: i64,
    pub tx_hash: TxHash,
}

impl From<BindingRow> for BindingRecord {
    fn from(row: BindingRow) -> Self {
        Self {
            address: row.address,
            passkey_id: row.passkey_id,
            credential_id: row.credential_id,
            public_key: row.public_key,
            timestamp: row.timestamp,
            tx_hash: row.tx_hash,
        }
    }
}

impl From<&BindingRecord> for BindingRow {
    fn from(record: &BindingRecord) -> Self {
        Self {
            address: record.address.clone(),
            passkey_id: record.passkey_id.clone(),
            credential_id: record.credential_id.clone(),
            public_key: record.public_key.clone(),
            timestamp: record.timestamp,
            tx_hash: record.tx_hash.clone(),
        }
    }
}

/// Timestamp columns come back as numbers or numeric strings depending on
/// the column type the table was created with.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Int(value) => Ok(value),
        #[allow(clippy::cast_possible_truncation)] // Millisecond timestamps fit in i64
        Millis::Float(value) => Ok(value as i64),
        Millis::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::Mutex;

    use super::*;

    const ADDRESS: &str = "0xabc0000000000000000000000000000000000123";

    fn row_json(timestamp: &str) -> String {
        format!(
            r#"{{"address":"{ADDRESS}","passkey_id":"pk","credential_id":"cGs=","public_key":null,"timestamp":{timestamp},"tx_hash":"0x01"}}"#
        )
    }

    #[test]
    fn test_row_timestamp_as_number() {
        let row: BindingRow = serde_json::from_str(&row_json("1700000000000")).unwrap();
        assert_eq!(row.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_row_timestamp_as_string() {
        let row: BindingRow = serde_json::from_str(&row_json("\"1700000000000\"")).unwrap();
        assert_eq!(row.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_row_rejects_bad_address() {
        let json = row_json("1").replace(ADDRESS, "nope");
        assert!(serde_json::from_str::<BindingRow>(&json).is_err());
    }

    #[test]
    fn test_row_to_record() {
        let row: BindingRow = serde_json::from_str(&row_json("5")).unwrap();
        let record = BindingRecord::from(row);
        assert_eq!(record.address.as_str(), ADDRESS);
        assert_eq!(record.credential_id.as_deref(), Some("cGs="));
        assert!(record.public_key.is_none());
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl BindingStore for FailingStore {
        async fn find_by_address(
            &self,
            _address: &WalletAddress,
        ) -> Result<Option<BindingRecord>, RepositoryError> {
            Err(RepositoryError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            })
        }

        async fn insert_if_absent(
            &self,
            record: &BindingRecord,
        ) -> Result<InsertOutcome, RepositoryError> {
            Ok(InsertOutcome::Inserted(record.clone()))
        }
    }

    struct OneRowStore(Mutex<Option<BindingRecord>>);

    #[async_trait::async_trait]
    impl BindingStore for OneRowStore {
        async fn find_by_address(
            &self,
            address: &WalletAddress,
        ) -> Result<Option<BindingRecord>, RepositoryError> {
            Ok(self
                .0
                .lock()
                .await
                .clone()
                .filter(|record| &record.address == address))
        }

        async fn insert_if_absent(
            &self,
            record: &BindingRecord,
        ) -> Result<InsertOutcome, RepositoryError> {
            let mut slot = self.0.lock().await;
            match slot.as_ref() {
                Some(existing) => Ok(InsertOutcome::AlreadyBound(existing.clone())),
                None => {
                    *slot = Some(record.clone());
                    Ok(InsertOutcome::Inserted(record.clone()))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_find_swallows_store_errors() {
        let lookup = BindingLookup::new(Arc::new(FailingStore));
        let address = WalletAddress::parse(ADDRESS).unwrap();

        assert!(lookup.find(&address).await.is_none());
        assert!(matches!(
            lookup.find_strict(&address).await,
            Err(RepositoryError::Api { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_find_returns_stored_record() {
        let row: BindingRow = serde_json::from_str(&row_json("5")).unwrap();
        let record = BindingRecord::from(row);
        let lookup = BindingLookup::new(Arc::new(OneRowStore(Mutex::new(Some(record.clone())))));

        let found = lookup.find(&record.address).await;
        assert_eq!(found, Some(record));
    }
}
