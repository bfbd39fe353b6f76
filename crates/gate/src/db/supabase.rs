//! Supabase (`PostgREST`) binding store.

use n1nj4_core::{BindingRecord, WalletAddress};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{BindingRow, BindingStore, InsertOutcome, RepositoryError};

/// Conflict handling for inserts: skip the row if the key exists and echo
/// back whatever was written.
const PREFER_INSERT_IF_ABSENT: &str = "resolution=ignore-duplicates,return=representation";

/// Binding store backed by a Supabase project's REST API.
#[derive(Clone)]
pub struct SupabaseBindingStore {
    client: reqwest::Client,
    table_url: Url,
}

impl SupabaseBindingStore {
    /// Create a store for one table of a Supabase project.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value, the table URL
    /// cannot be built, or the HTTP client fails to build.
    pub fn new(
        project_url: &Url,
        anon_key: &SecretString,
        table: &str,
    ) -> Result<Self, RepositoryError> {
        let mut headers = HeaderMap::new();

        let key = anon_key.expose_secret();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|e| {
                RepositoryError::Configuration(format!("Invalid anon key format: {e}"))
            })?,
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                RepositoryError::Configuration(format!("Invalid anon key format: {e}"))
            })?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let table_url = project_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| RepositoryError::Configuration(format!("Invalid table URL: {e}")))?;

        Ok(Self { client, table_url })
    }

    fn address_filter_url(&self, address: &WalletAddress) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("address", &format!("eq.{address}"))
            .append_pair("limit", "1");
        url
    }

    async fn error_from(response: reqwest::Response) -> RepositoryError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        RepositoryError::Api { status, message }
    }

    async fn rows_from(response: reqwest::Response) -> Result<Vec<BindingRow>, RepositoryError> {
        response
            .json()
            .await
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }
}

#[async_trait::async_trait]
impl BindingStore for SupabaseBindingStore {
    #[tracing::instrument(skip(self), fields(address = %address))]
    async fn find_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<BindingRecord>, RepositoryError> {
        let response = self
            .client
            .get(self.address_filter_url(address))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let rows = Self::rows_from(response).await?;
        Ok(rows.into_iter().next().map(BindingRecord::from))
    }

    #[tracing::instrument(skip(self, record), fields(address = %record.address))]
    async fn insert_if_absent(
        &self,
        record: &BindingRecord,
    ) -> Result<InsertOutcome, RepositoryError> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("on_conflict", "address");

        let response = self
            .client
            .post(url)
            .header("Prefer", PREFER_INSERT_IF_ABSENT)
            .json(&[BindingRow::from(record)])
            .send()
            .await?;
        let status = response.status();

        // 409 comes back when the table has a unique constraint PostgREST
        // did not resolve through `on_conflict`.
        let inserted = if status == StatusCode::CONFLICT {
            None
        } else if status.is_success() {
            Self::rows_from(response).await?.into_iter().next()
        } else {
            return Err(Self::error_from(response).await);
        };

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
