//! `WebAuthn` credential creation options.
//!
//! Serialized, the options are the `PublicKeyCredentialCreationOptionsJSON`
//! that `PublicKeyCredential.parseCreationOptionsFromJSON` expects: binary
//! fields (`challenge`, `user.id`) are base64url without padding.

use n1nj4_core::WalletAddress;
use webauthn_rs_proto::{
    AttestationConveyancePreference, AuthenticatorAttachment, AuthenticatorSelectionCriteria,
    PubKeyCredParams, PublicKeyCredentialCreationOptions, RelyingParty, ResidentKeyRequirement,
    User, UserVerificationPolicy,
};

use crate::config::RelyingPartyConfig;

/// COSE algorithm id for ECDSA w/ SHA-256.
pub const ES256: i64 = -7;
/// COSE algorithm id for RSASSA-PKCS1-v1_5 w/ SHA-256.
pub const RS256: i64 = -257;

/// Ceremony timeout in milliseconds.
pub const TIMEOUT_MS: u32 = 60_000;

/// Length of the random challenge in bytes.
pub const CHALLENGE_LEN: usize = 32;

/// Options for a discoverable, user-verified platform passkey bound to
/// `address`.
///
/// The user handle is the address's UTF-8 bytes, so one address maps to
/// one discoverable credential per authenticator.
#[must_use]
pub fn creation_options(
    relying_party: &RelyingPartyConfig,
    address: &WalletAddress,
    challenge: &[u8; CHALLENGE_LEN],
) -> PublicKeyCredentialCreationOptions {
    PublicKeyCredentialCreationOptions {
        rp: RelyingParty {
            name: relying_party.name.clone(),
            id: relying_party.id.clone(),
        },
        user: User {
            id: address.as_bytes().to_vec().into(),
            name: address.to_string(),
            display_name: address.short(),
        },
        challenge: challenge.to_vec().into(),
        pub_key_cred_params: [ES256, RS256]
            .into_iter()
            .map(|alg| PubKeyCredParams {
                type_: "public-key".to_string(),
                alg,
            })
            .collect(),
        timeout: Some(TIMEOUT_MS),
        exclude_credentials: None,
        authenticator_selection: Some(AuthenticatorSelectionCriteria {
            authenticator_attachment: Some(AuthenticatorAttachment::Platform),
            resident_key: Some(ResidentKeyRequirement::Required),
            require_resident_key: true,
            user_verification: UserVerificationPolicy::Required,
        }),
        hints: None,
        attestation: Some(AttestationConveyancePreference::Direct),
        attestation_formats: None,
        extensions: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use url::Url;

    use super::*;

    fn relying_party() -> RelyingPartyConfig {
        RelyingPartyConfig {
            origin: Url::parse("https://passport.n1nj4.io").unwrap(),
            id: "passport.n1nj4.io".to_string(),
            name: "N1NJ4 Verification".to_string(),
        }
    }

    fn options() -> PublicKeyCredentialCreationOptions {
        let address = WalletAddress::parse("0xABC0000000000000000000000000000000000123").unwrap();
        creation_options(&relying_party(), &address, &[7u8; CHALLENGE_LEN])
    }

    #[test]
    fn test_user_entity() {
        let options = options();
        assert_eq!(options.user.name, "0xabc0000000000000000000000000000000000123");
        assert_eq!(options.user.display_name, "0xabc000...0123");

        let id: &[u8] = options.user.id.as_ref();
        assert_eq!(id, b"0xabc0000000000000000000000000000000000123");
    }

    #[test]
    fn test_challenge_is_passed_through() {
        let options = options();
        let challenge: &[u8] = options.challenge.as_ref();
        assert_eq!(challenge, [7u8; CHALLENGE_LEN]);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(options()).unwrap();

        assert_eq!(json["rp"]["name"], "N1NJ4 Verification");
        assert_eq!(json["rp"]["id"], "passport.n1nj4.io");
        assert_eq!(json["user"]["displayName"], "0xabc000...0123");
        assert_eq!(
            json["user"]["id"],
            URL_SAFE_NO_PAD.encode(b"0xabc0000000000000000000000000000000000123")
        );
        assert_eq!(json["challenge"], URL_SAFE_NO_PAD.encode([7u8; CHALLENGE_LEN]));
        assert_eq!(json["pubKeyCredParams"][0]["type"], "public-key");
        assert_eq!(json["pubKeyCredParams"][0]["alg"], -7);
        assert_eq!(json["pubKeyCredParams"][1]["alg"], -257);
        assert_eq!(
            json["authenticatorSelection"]["authenticatorAttachment"],
            "platform"
        );
        assert_eq!(json["authenticatorSelection"]["residentKey"], "required");
        assert_eq!(json["authenticatorSelection"]["requireResidentKey"], true);
        assert_eq!(
            json["authenticatorSelection"]["userVerification"],
            "required"
        );
        assert_eq!(json["timeout"], 60_000);
        assert_eq!(json["attestation"], "direct");
        assert!(json.get("excludeCredentials").is_none());
    }
}
