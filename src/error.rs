//! Error taxonomy for the webhook protocol layer and the management API

use thiserror::Error;

/// Why an encrypted payload could not be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecryptError {
    #[error("ciphertext is not valid base64")]
    BadEncoding,
    #[error("ciphertext length is not a multiple of the AES block size")]
    BadBlockAlignment,
    #[error("inconsistent PKCS#7 padding")]
    BadPadding,
    #[error("plaintext frame is shorter than its declared length")]
    Truncated,
    #[error("encoding AES key must be 43 characters of base64")]
    BadKey,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not match. Always fatal to the request.
    #[error("request signature mismatch")]
    Auth,

    #[error("failed to decrypt payload: {0}")]
    Decrypt(#[from] DecryptError),

    /// Payload decrypted fine but was sealed for another tenant.
    #[error("payload tenant {found:?} does not match configured tenant {expected:?}")]
    TenantMismatch { expected: String, found: String },

    #[error("failed to decode message XML: {0}")]
    Decode(String),

    #[error("failed to encode reply XML: {0}")]
    Encode(String),

    #[error("credential fetch failed: {reason}")]
    CredentialFetch { reason: String, retryable: bool },

    /// Management API answered with a non-zero `errcode`.
    #[error("platform error {code}: {message}")]
    Remote { code: i64, message: String },

    /// Management API answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WebhookError {
    /// Whether the caller may reasonably try the same operation again.
    pub fn is_retryable(&self) -> bool {
        match self {
            WebhookError::CredentialFetch { retryable, .. } => *retryable,
            WebhookError::Http(e) => e.is_timeout() || e.is_connect(),
            WebhookError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Wrap a transport failure from the credential endpoint.
    pub(crate) fn credential_transport(err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect();
        WebhookError::CredentialFetch {
            reason: err.to_string(),
            retryable,
        }
    }
}

impl From<quick_xml::DeError> for WebhookError {
    fn from(err: quick_xml::DeError) -> Self {
        WebhookError::Decode(err.to_string())
    }
}

pub type Result<T, E = WebhookError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let fetch = WebhookError::CredentialFetch {
            reason: "timed out".into(),
            retryable: true,
        };
        assert!(fetch.is_retryable());
        assert!(!WebhookError::Auth.is_retryable());
        assert!(!WebhookError::Decrypt(DecryptError::BadPadding).is_retryable());
        let remote = WebhookError::Remote {
            code: 40001,
            message: "invalid credential".into(),
        };
        assert!(!remote.is_retryable());

        let unavailable = WebhookError::HttpStatus {
            status: 503,
            body: String::new(),
        };
        assert!(unavailable.is_retryable());
        let not_found = WebhookError::HttpStatus {
            status: 404,
            body: String::new(),
        };
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_decrypt_error_converts() {
        let err: WebhookError = DecryptError::BadBlockAlignment.into();
        assert!(matches!(
            err,
            WebhookError::Decrypt(DecryptError::BadBlockAlignment)
        ));
    }
}
