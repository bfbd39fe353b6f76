//! Address-to-passkey binding types.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::address::WalletAddress;

/// Transaction hash recorded with a binding.
///
/// No on-chain transaction backs a binding; the gate fills this with 32
/// locally generated random bytes, so it carries no integrity guarantee and
/// must never be looked up on a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Number of bytes the hash encodes.
    pub const BYTES: usize = 32;

    /// Build a hash from raw bytes, hex encoded with a `0x` prefix.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; Self::BYTES]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Wrap a hash read back from storage.
    #[must_use]
    pub const fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TxHash {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TxHash {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TxHash {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// The permanent association between a wallet address and a passkey.
///
/// Created exactly once per address when the first bind succeeds, then only
/// ever read. There is no update or delete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    /// Bound wallet address (lower case).
    pub address: WalletAddress,
    /// Credential id as reported by the authenticator (base64url).
    pub passkey_id: String,
    /// Raw credential id, standard base64.
    pub credential_id: Option<String>,
    /// Public key reported by the authenticator, if any.
    pub public_key: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Placeholder transaction hash, see [`TxHash`].
    pub tx_hash: TxHash,
}

impl BindingRecord {
    /// Returns the creation time as a UTC datetime.
    ///
    /// Returns `None` if the stored timestamp is out of range.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
