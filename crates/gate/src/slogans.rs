//! User-facing copy.
//!
//! Every string the flow shows to a user lives here so the rendering layer
//! never has to invent text.

pub const TITLE: &str = "N1NJ4 Verification";
pub const SUBTITLE: &str = "Verify your humanity with NFT + Passkey";
pub const DESCRIPTION: &str = "Connect your Injective wallet to verify your Origin NFT status and link your Soulbound Passport.";
pub const FOOTER_TEXT: &str = "Human Verification Completed";
pub const PASSPORT_TITLE: &str = "N1NJ4 PASSPORT";
pub const AUTHORIZE_HINT: &str = "Please authorize in INJ Pass";
pub const CONNECT_WALLET: &str = "Connect Wallet";
pub const BIND_BTN: &str = "Bind as Soulbound Token";

/// Default collection display name.
pub const NFT_NAME: &str = "N1NJ4:Origin";

/// Loading overlay texts, one per flow phase.
pub mod loading {
    pub const VERIFYING: &str = "Checking NFT ownership...";
    pub const CONNECTING: &str = "Connecting wallet...";
    pub const SEARCHING: &str = "Checking existing binding...";
    pub const CREATING_PASSKEY: &str = "Creating Passkey...";
    pub const BINDING: &str = "Binding...";
}
