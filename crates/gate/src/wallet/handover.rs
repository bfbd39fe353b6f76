//! Signature handover from an external signing flow.
//!
//! A page loaded with `?address=...&sig=...` skips the wallet connect step.
//! The signature is carried but NOT verified: whoever builds the URL picks
//! the address. Treat this entry point as unauthenticated.

use url::Url;

/// Address and signature handed over through query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handover {
    address: String,
    signature: String,
}

impl Handover {
    /// Build a handover from raw values.
    ///
    /// Returns `None` unless both values are non-empty.
    #[must_use]
    pub fn new(address: impl Into<String>, signature: impl Into<String>) -> Option<Self> {
        let address = address.into();
        let signature = signature.into();

        if address.trim().is_empty() || signature.trim().is_empty() {
            return None;
        }

        Some(Self { address, signature })
    }

    /// Extract the `address` and `sig` query parameters from a page URL.
    ///
    /// Returns `None` unless both are present and non-empty.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut address = None;
        let mut signature = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "address" => address = Some(value.into_owned()),
                "sig" => signature = Some(value.into_owned()),
                _ => {}
            }
        }

        Self::new(address?, signature?)
    }

    /// The claimed address, as received.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The unverified signature, as received.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_with_both_params() {
        let url = Url::parse(
            "https://passport.n1nj4.io/?address=0xAbC0000000000000000000000000000000000123&sig=0xdeadbeef",
        )
        .unwrap();

        let handover = Handover::from_url(&url).unwrap();
        assert_eq!(
            handover.address(),
            "0xAbC0000000000000000000000000000000000123"
        );
        assert_eq!(handover.signature(), "0xdeadbeef");
    }

    #[test]
    fn test_from_url_missing_sig() {
        let url = Url::parse("https://passport.n1nj4.io/?address=0xabc").unwrap();
        assert!(Handover::from_url(&url).is_none());
    }

    #[test]
    fn test_from_url_empty_sig() {
        let url = Url::parse("https://passport.n1nj4.io/?address=0xabc&sig=").unwrap();
        assert!(Handover::from_url(&url).is_none());
    }

    #[test]
    fn test_from_url_without_query() {
        let url = Url::parse("https://passport.n1nj4.io/").unwrap();
        assert!(Handover::from_url(&url).is_none());
    }
}
