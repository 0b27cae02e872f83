//! Access-token storage and on-demand refresh

use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, RwLock};

use crate::error::{Result, WebhookError};

/// Renew this many seconds before the platform's stated expiry.
pub const SAFETY_MARGIN_SECS: u64 = 600;

/// Seconds a freshly issued credential is served from cache. Short-lived
/// tokens that cannot absorb the full margin are kept for half their ttl.
fn lifetime(ttl_secs: u64) -> u64 {
    if ttl_secs > SAFETY_MARGIN_SECS {
        ttl_secs - SAFETY_MARGIN_SECS
    } else {
        (ttl_secs / 2).max(1)
    }
}

/// Bearer credential for the management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: String,
    /// Unix seconds after which the cache treats the value as stale.
    pub expires_at: u64,
}

impl Credential {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Credential as returned by the issuance endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub value: String,
    pub ttl_secs: u64,
}

/// Source of fresh credentials.
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self) -> impl Future<Output = Result<IssuedCredential>> + Send;
}

/// Wall clock in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Caches one credential and refreshes it when it goes stale.
///
/// Reads take a shared lock. Refreshes are serialised so concurrent misses
/// result in a single call to the issuer.
pub struct CredentialCache<I, C = SystemClock> {
    issuer: I,
    clock: C,
    current: RwLock<Option<Credential>>,
    refresh: Mutex<()>,
}

impl<I: CredentialIssuer> CredentialCache<I> {
    pub fn new(issuer: I) -> Self {
        Self::with_clock(issuer, SystemClock)
    }
}

impl<I: CredentialIssuer, C: Clock> CredentialCache<I, C> {
    pub fn with_clock(issuer: I, clock: C) -> Self {
        Self {
            issuer,
            clock,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// True when there is no credential or the cached one is stale.
    pub async fn is_expired(&self) -> bool {
        self.fresh(self.clock.now()).await.is_none()
    }

    /// Cached credential, if any, regardless of expiry.
    pub async fn peek(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    async fn fresh(&self, now: u64) -> Option<Credential> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|c| !c.is_expired_at(now))
            .cloned()
    }

    /// Return a credential that has not expired, fetching a new one if needed.
    ///
    /// A failed refresh leaves the cached value untouched.
    pub async fn ensure_valid(&self) -> Result<Credential> {
        if let Some(credential) = self.fresh(self.clock.now()).await {
            return Ok(credential);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(credential) = self.fresh(self.clock.now()).await {
            return Ok(credential);
        }

        tracing::debug!("Access token missing or expired, requesting a new one");
        let issued = self.issuer.issue().await?;
        if issued.value.is_empty() || issued.ttl_secs == 0 {
            return Err(WebhookError::CredentialFetch {
                reason: "issuer returned an empty or already expired token".into(),
                retryable: false,
            });
        }
        let now = self.clock.now();
        let expires_at = now.checked_add(lifetime(issued.ttl_secs)).ok_or_else(|| {
            WebhookError::CredentialFetch {
                reason: format!("token lifetime {}s is out of range", issued.ttl_secs),
                retryable: false,
            }
        })?;
        let credential = Credential {
            value: issued.value,
            expires_at,
        };
        tracing::info!(
            "Access token refreshed, valid for {}s",
            credential.expires_at.saturating_sub(now)
        );

        *self.current.write().await = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}
