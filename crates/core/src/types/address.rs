//! EVM wallet address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`WalletAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The input string is empty.
    #[error("address cannot be empty")]
    Empty,
    /// The input does not start with `0x`.
    #[error("address must start with 0x")]
    MissingPrefix,
    /// The input has the wrong number of hex digits.
    #[error("address must have {expected} hex digits (got {actual})")]
    WrongLength {
        /// Required number of hex digits.
        expected: usize,
        /// Number of digits found.
        actual: usize,
    },
    /// The input contains a non-hex character.
    #[error("address contains a non-hex character: {0:?}")]
    InvalidCharacter(char),
}

/// An EVM account address, normalized to lower case.
///
/// Normalization happens once at parse time, so two addresses that differ
/// only in checksum casing compare equal and hit the same binding row.
///
/// ## Examples
///
/// ```
/// use n1nj4_core::WalletAddress;
///
/// let address = WalletAddress::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
/// assert_eq!(address.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
///
/// assert!(WalletAddress::parse("").is_err());
/// assert!(WalletAddress::parse("abcdef").is_err());
/// assert!(WalletAddress::parse("0x1234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Number of hex digits after the `0x` prefix.
    pub const HEX_DIGITS: usize = 40;

    /// Parse a `WalletAddress` from a string, lower-casing it.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Does not start with `0x` (or `0X`)
    /// - Does not have exactly 40 hex digits after the prefix
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;

        if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidCharacter(c));
        }

        if digits.len() != Self::HEX_DIGITS {
            return Err(AddressError::WrongLength {
                expected: Self::HEX_DIGITS,
                actual: digits.len(),
            });
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the address text as bytes.
    ///
    /// Used as the passkey user handle.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the abbreviated form shown to users: the first 8 characters,
    /// an ellipsis, then the last 4 characters.
    #[must_use]
    pub fn short(&self) -> String {
        let head = self.0.get(..8).unwrap_or(&self.0);
        let tail = self.0.get(self.0.len().saturating_sub(4)..).unwrap_or("");
        format!("{head}...{tail}")
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for WalletAddress {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for WalletAddress {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for WalletAddress {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
