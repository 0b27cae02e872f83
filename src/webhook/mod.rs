//! Webhook protocol façade
//!
//! Ties signature checks, payload decryption and the XML codec together
//! for the two things a callback handler does: turn an inbound HTTP
//! exchange into a [`Request`], and turn a [`Reply`] into a response body.

use std::borrow::Cow;

use crate::crypto::{self, AesKey};
use crate::error::{Result, WebhookError};
use crate::message::{self, Reply, Request};

/// Per-account settings for callback handling.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// App id sealed into every encrypted payload.
    pub app_id: String,
    /// Shared token used for request signatures.
    pub token: String,
    /// Present when the account runs in encrypted ("safe") mode.
    pub aes_key: Option<AesKey>,
}

/// Query parameters and body of one callback request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRequest {
    pub timestamp: String,
    pub nonce: String,
    pub signature: Option<String>,
    pub msg_signature: Option<String>,
    /// Only on the URL verification GET.
    pub echostr: Option<String>,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Build from the callback URL's query string and the request body.
    pub fn from_query(query: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut raw = RawRequest {
            body: body.into(),
            ..Default::default()
        };
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "timestamp" => raw.timestamp = value.into_owned(),
                "nonce" => raw.nonce = value.into_owned(),
                "signature" => raw.signature = Some(value.into_owned()),
                "msg_signature" => raw.msg_signature = Some(value.into_owned()),
                "echostr" => raw.echostr = Some(value.into_owned()),
                _ => {}
            }
        }
        raw
    }
}

pub struct Webhook {
    config: WebhookConfig,
}

impl Webhook {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    fn check_signature(&self, raw: &RawRequest) -> Result<()> {
        if let Some(signature) = &raw.signature {
            if !crypto::is_valid(&raw.timestamp, &raw.nonce, signature, &self.config.token) {
                tracing::warn!(timestamp = %raw.timestamp, "Rejected request with bad signature");
                return Err(WebhookError::Auth);
            }
        }
        Ok(())
    }

    fn check_msg_signature(&self, raw: &RawRequest, encrypt: &str) -> Result<()> {
        if let Some(signature) = &raw.msg_signature {
            if !crypto::is_valid_msg_signature(
                &raw.timestamp,
                &raw.nonce,
                encrypt,
                signature,
                &self.config.token,
            ) {
                tracing::warn!(timestamp = %raw.timestamp, "Rejected request with bad msg_signature");
                return Err(WebhookError::Auth);
            }
        }
        Ok(())
    }

    fn open(&self, encrypt: &str, key: &AesKey) -> Result<Vec<u8>> {
        let plain = crypto::decrypt(encrypt, key)?;
        Ok(crypto::extract_and_validate(&plain, &self.config.app_id)?.to_vec())
    }

    /// Authenticate an inbound callback and decode its message.
    ///
    /// Signatures are checked before any decryption is attempted.
    pub fn authenticate_and_parse(&self, raw: &RawRequest) -> Result<Request> {
        self.check_signature(raw)?;

        let xml: Cow<'_, [u8]> = match &self.config.aes_key {
            Some(key) => {
                let envelope = message::decode_encrypted(&raw.body)?;
                self.check_msg_signature(raw, &envelope.encrypt)?;
                Cow::Owned(self.open(&envelope.encrypt, key)?)
            }
            None => Cow::Borrowed(raw.body.as_slice()),
        };

        let request = message::decode_request(&xml)?;
        tracing::debug!(
            msg_type = request.msg_type().as_str(),
            from = %request.header.from_user_name,
            "Decoded callback message"
        );
        Ok(request)
    }

    /// Answer the URL verification handshake with the echo string.
    ///
    /// In encrypted mode with a `msg_signature`, the echo string is itself
    /// ciphertext and is decrypted before being returned.
    pub fn verify_url(&self, raw: &RawRequest) -> Result<String> {
        let echostr = raw
            .echostr
            .as_deref()
            .ok_or_else(|| WebhookError::Decode("verification request has no echostr".into()))?;

        match (&self.config.aes_key, &raw.msg_signature) {
            (Some(key), Some(_)) => {
                self.check_msg_signature(raw, echostr)?;
                let plain = self.open(echostr, key)?;
                String::from_utf8(plain).map_err(|e| WebhookError::Decode(e.to_string()))
            }
            _ => {
                if raw.signature.is_none() {
                    return Err(WebhookError::Auth);
                }
                self.check_signature(raw)?;
                Ok(echostr.to_string())
            }
        }
    }

    /// Empty reply addressed back to the sender of `request`.
    pub fn build_reply(&self, request: &Request) -> Reply {
        Reply::to_request(request)
    }

    /// Encrypt and sign an encoded reply for an account in encrypted mode.
    pub fn seal_reply(&self, reply: &Reply, timestamp: &str, nonce: &str) -> Result<Vec<u8>> {
        let key = self
            .config
            .aes_key
            .as_ref()
            .ok_or_else(|| WebhookError::Config("no encoding AES key configured".into()))?;

        let xml = message::encode_reply(reply)?;
        let encrypt = crypto::seal(&xml, &self.config.app_id, key)?;
        let signature =
            crypto::make_signature(&[self.config.token.as_str(), timestamp, nonce, encrypt.as_str()]);
        message::encode_encrypted(&encrypt, &signature, timestamp, nonce)
    }

    /// Response body for `reply`: sealed when encryption is configured,
    /// plain otherwise.
    pub fn respond(&self, reply: &Reply, raw: &RawRequest) -> Result<Vec<u8>> {
        if self.config.aes_key.is_some() {
            self.seal_reply(reply, &raw.timestamp, &raw.nonce)
        } else {
            message::encode_reply(reply)
        }
    }
}
