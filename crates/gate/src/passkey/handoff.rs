//! Authenticator that hands the ceremony to a browser.
//!
//! Writes the creation options as one line of JSON, then reads one line
//! back: either a `RegistrationResponseJSON` (what
//! `PublicKeyCredential.toJSON()` produces) or `{"error": "<DOMException name>"}`.
//! An empty line or end of input counts as a cancellation.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use webauthn_rs_proto::{PublicKeyCredentialCreationOptions, RegisterPublicKeyCredential};

use super::{AuthenticatorError, CreatedCredential, PlatformAuthenticator};

/// DOMException names a browser reports when the user backs out.
const CANCELLED_ERRORS: [&str; 2] = ["NotAllowedError", "AbortError"];

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

/// [`PlatformAuthenticator`] over a line-oriented reader and writer.
pub struct HandoffAuthenticator<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl HandoffAuthenticator<BufReader<Stdin>, Stdout> {
    /// Hand off through the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> HandoffAuthenticator<R, W> {
    /// Hand off through arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }
}

impl<R, W: AsyncWrite + Unpin> HandoffAuthenticator<R, W> {
    async fn send(&self, json: &str) -> std::io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(json.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    }
}

#[async_trait::async_trait]
impl<R, W> PlatformAuthenticator for HandoffAuthenticator<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn create(
        &self,
        options: &PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        let json = serde_json::to_string(options)
            .map_err(|e| AuthenticatorError::Failed(e.to_string()))?;

        self.send(&json)
            .await
            .map_err(|e| AuthenticatorError::Failed(e.to_string()))?;

        let mut line = String::new();
        self.input
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| AuthenticatorError::Failed(e.to_string()))?;

        parse_reply(line.trim())
    }
}

fn parse_reply(line: &str) -> Result<CreatedCredential, AuthenticatorError> {
    if line.is_empty() {
        return Err(AuthenticatorError::Cancelled);
    }

    let reply: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| AuthenticatorError::Failed(format!("unreadable credential: {e}")))?;

    if let Ok(ErrorReply { error }) = ErrorReply::deserialize(&reply) {
        if CANCELLED_ERRORS.contains(&error.as_str()) {
            return Err(AuthenticatorError::Cancelled);
        }
        return Err(AuthenticatorError::Failed(error));
    }

    let credential = RegisterPublicKeyCredential::deserialize(&reply)
        .map_err(|e| AuthenticatorError::Failed(format!("unreadable credential: {e}")))?;
    let raw_id: &[u8] = credential.raw_id.as_ref();

    // Not part of the attestation response proper; `toJSON()` adds it.
    let public_key = reply
        .pointer("/response/publicKey")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    Ok(CreatedCredential {
        raw_id: raw_id.to_vec(),
        id: credential.id,
        public_key,
    })
}
