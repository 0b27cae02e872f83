//! Access-token issuance endpoint
//!
//! `GET {api_base}/token?grant_type=client_credential&appid=..&secret=..`
//! answers `{"access_token": "..", "expires_in": 7200}` on success and
//! `{"errcode": .., "errmsg": ".."}` otherwise.

use serde::Deserialize;
use url::Url;

use super::tokens::{CredentialIssuer, IssuedCredential};
use crate::error::{Result, WebhookError};

/// Platform error code meaning "system busy, try again".
const ERRCODE_BUSY: i64 = -1;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Fetches access tokens over HTTPS.
pub struct HttpIssuer {
    http: reqwest::Client,
    app_id: String,
    secret: String,
    endpoint: Url,
}

impl HttpIssuer {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        app_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/token", api_base.trim_end_matches('/')))
            .map_err(|e| WebhookError::Config(format!("bad api base {:?}: {}", api_base, e)))?;
        Ok(Self {
            http,
            app_id: app_id.into(),
            secret: secret.into(),
            endpoint,
        })
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("grant_type", "client_credential")
            .append_pair("appid", &self.app_id)
            .append_pair("secret", &self.secret);
        url
    }
}

impl CredentialIssuer for HttpIssuer {
    async fn issue(&self) -> Result<IssuedCredential> {
        tracing::debug!("Requesting access token for app {}", self.app_id);

        let resp = self
            .http
            .get(self.request_url())
            .send()
            .await
            .map_err(WebhookError::credential_transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WebhookError::CredentialFetch {
                reason: format!("token endpoint returned HTTP {}", status.as_u16()),
                retryable: status.is_server_error(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(WebhookError::credential_transport)?;
        parse_token_response(&body)
    }
}

fn parse_token_response(body: &str) -> Result<IssuedCredential> {
    let parsed: TokenResponse =
        serde_json::from_str(body).map_err(|e| WebhookError::CredentialFetch {
            reason: format!("malformed token response: {}", e),
            retryable: false,
        })?;

    if parsed.errcode != 0 {
        return Err(WebhookError::CredentialFetch {
            reason: format!("errcode {}: {}", parsed.errcode, parsed.errmsg),
            retryable: parsed.errcode == ERRCODE_BUSY,
        });
    }

    match (parsed.access_token, parsed.expires_in) {
        (Some(value), Some(ttl_secs)) if !value.is_empty() => {
            Ok(IssuedCredential { value, ttl_secs })
        }
        _ => Err(WebhookError::CredentialFetch {
            reason: "token response missing access_token or expires_in".into(),
            retryable: false,
        }),
    }
}
