//! NFT ownership data.

use serde::{Deserialize, Serialize};

/// The gating token found for an owner.
///
/// Derived from a contract read and never persisted. Only the owner's token
/// at enumeration index 0 is ever represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftData {
    /// Token id in decimal.
    pub token_id: String,
    /// Collection display name.
    pub name: String,
}
