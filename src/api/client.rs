//! Authenticated HTTP client for the management API
//!
//! Wraps reqwest::Client with access-token injection and maps the
//! platform's `errcode`/`errmsg` replies into [`WebhookError::Remote`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::auth::{CredentialCache, CredentialIssuer, HttpIssuer};
use crate::error::{Result, WebhookError};

pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com/cgi-bin";

/// Error codes meaning the access token itself was rejected.
const ERRCODE_INVALID_TOKEN: i64 = 40001;
const ERRCODE_EXPIRED_TOKEN: i64 = 42001;

/// Management API client sharing one credential cache across calls.
pub struct ApiClient<I = HttpIssuer> {
    http: reqwest::Client,
    base: String,
    credentials: Arc<CredentialCache<I>>,
}

impl ApiClient<HttpIssuer> {
    /// Build a client whose requests (token issuance included) time out
    /// after `timeout`.
    pub fn new(api_base: &str, app_id: &str, secret: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let issuer = HttpIssuer::new(http.clone(), api_base, app_id, secret)?;
        Ok(Self::with_credentials(
            http,
            api_base,
            Arc::new(CredentialCache::new(issuer)),
        ))
    }
}

impl<I: CredentialIssuer> ApiClient<I> {
    pub fn with_credentials(
        http: reqwest::Client,
        api_base: &str,
        credentials: Arc<CredentialCache<I>>,
    ) -> Self {
        Self {
            http,
            base: api_base.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &CredentialCache<I> {
        &self.credentials
    }

    async fn endpoint(&self, path: &str) -> Result<Url> {
        let credential = self.credentials.ensure_valid().await?;
        let mut url = Url::parse(&format!("{}{}", self.base, path))
            .map_err(|e| WebhookError::Config(format!("bad API path {}: {}", path, e)))?;
        url.query_pairs_mut()
            .append_pair("access_token", &credential.value);
        Ok(url)
    }

    /// GET `path` with the access token attached.
    pub async fn get(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.endpoint(path).await?;
        tracing::debug!("API GET {}{}", self.base, path);

        let resp = self.http.get(url).send().await?;
        self.check_response(resp).await
    }

    /// POST a JSON body to `path` with the access token attached.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value> {
        let url = self.endpoint(path).await?;
        tracing::debug!("API POST {}{}", self.base, path);

        // The platform rejects \uXXXX escapes in some fields, so send raw UTF-8.
        let payload = serde_json::to_vec(body)
            .map_err(|e| WebhookError::Encode(format!("request body: {}", e)))?;
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(payload)
            .send()
            .await?;
        self.check_response(resp).await
    }

    async fn check_response(&self, resp: reqwest::Response) -> Result<serde_json::Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body = resp.text().await?;
        let result = check_errcode(&body);
        if let Err(WebhookError::Remote { code, .. }) = &result {
            if *code == ERRCODE_INVALID_TOKEN || *code == ERRCODE_EXPIRED_TOKEN {
                tracing::warn!("Access token rejected (errcode {}), dropping cache", code);
                self.credentials.invalidate().await;
            }
        }
        result
    }
}

/// HTTP-level failure, kept apart from the platform's own `errcode` space.
fn status_error(status: reqwest::StatusCode, body: String) -> WebhookError {
    WebhookError::HttpStatus {
        status: status.as_u16(),
        body,
    }
}

/// Parse a JSON reply and surface a non-zero `errcode` as an error.
pub(crate) fn check_errcode(body: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| WebhookError::Decode(format!("API response is not JSON: {}", e)))?;

    let code = value.get("errcode").and_then(|c| c.as_i64()).unwrap_or(0);
    if code != 0 {
        let message = value
            .get("errmsg")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(WebhookError::Remote { code, message });
    }
    Ok(value)
}
