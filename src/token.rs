use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::TokenGrant;

/// Tokens are considered expired this long before the platform says so.
pub const REFRESH_MARGIN_MS: i64 = 60_000;

/// An access token and the instant it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl AccessToken {
    pub fn from_grant(grant: TokenGrant, issued_at: i64) -> Self {
        let lifetime_ms = i64::try_from(grant.lifetime_secs())
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        Self {
            expires_at: issued_at.saturating_add(lifetime_ms),
            value: grant.access_token,
        }
    }

    /// Still usable at `now`, refresh margin included.
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at - REFRESH_MARGIN_MS
    }
}

/// Owns the current access token.
///
/// A single mutex guards the check-and-fetch sequence, so concurrent callers
/// wait for one in-flight refresh and share its result. The fetch itself is
/// supplied by the caller.
pub struct TokenManager {
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached token, fetching a new one if it is absent or inside
    /// the refresh margin.
    pub async fn ensure_token<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenGrant>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.is_fresh(self.clock.now_millis()) {
                return Ok(token.value.clone());
            }
            debug!("Access token is about to expire, refreshing");
        }
        self.refresh_locked(&mut slot, fetch).await
    }

    /// Replace a token the platform rejected.
    ///
    /// If another caller already swapped `rejected` for a fresh token, that one
    /// is returned without fetching again.
    pub async fn refresh_rejected<F, Fut>(&self, rejected: &str, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenGrant>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.value != rejected && token.is_fresh(self.clock.now_millis()) {
                debug!("Rejected token was already replaced");
                return Ok(token.value.clone());
            }
        }
        self.refresh_locked(&mut slot, fetch).await
    }

    /// Copy of the current token, if any.
    pub async fn snapshot(&self) -> Option<AccessToken> {
        self.slot.lock().await.clone()
    }

    async fn refresh_locked<F, Fut>(&self, slot: &mut Option<AccessToken>, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenGrant>>,
    {
        // A failed fetch leaves the slot empty.
        *slot = None;
        let grant = fetch().await?;
        let token = AccessToken::from_grant(grant, self.clock.now_millis());
        info!("Obtained access token, expires at {}", token.expires_at);

        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }
}
