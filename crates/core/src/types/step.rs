//! Verification flow steps.

use serde::{Deserialize, Serialize};

/// Step of the verification flow.
///
/// Transient state, never persisted. A new flow always starts at
/// [`AppStep::Connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppStep {
    /// Waiting for a wallet connection.
    #[default]
    Connect,
    /// NFT found, waiting for the passkey bind.
    Nft,
    /// Binding exists. Terminal.
    Verified,
}

impl AppStep {
    /// Whether the flow can no longer change step.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl std::fmt::Display for AppStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Nft => write!(f, "nft"),
            Self::Verified => write!(f, "verified"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_connect() {
        assert_eq!(AppStep::default(), AppStep::Connect);
    }

    #[test]
    fn test_only_verified_is_terminal() {
        assert!(!AppStep::Connect.is_terminal());
        assert!(!AppStep::Nft.is_terminal());
        assert!(AppStep::Verified.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(AppStep::Nft.to_string(), "nft");
    }
}
