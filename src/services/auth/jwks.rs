//! Remote JWKS key provider.
//!
//! - Fetches the provider's JWKS document with a bounded timeout.
//! - Caches the resulting `KeySet` for `cache_ttl`.
//! - A `kid` the cache does not know triggers a refetch (key rotation), but at most
//!   once per `min_refresh_interval` so random `kid`s cannot flood the provider.
//! - If a refetch fails while the cached set still holds the requested `kid`, the
//!   cached set is served instead of failing the request.
//! - A failed fetch is remembered for `min_refresh_interval`; callers queued behind it
//!   get the same answer instead of each paying another `fetch_timeout`.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::error::AuthError;
use super::key_set::{KeyProvider, KeySet};

#[derive(Debug, Clone)]
pub struct JwksSettings {
    pub url: Url,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    pub min_refresh_interval: Duration,
}

#[derive(Debug, Clone)]
struct CachedKeys {
    keys: Arc<KeySet>,
    fetched_at: Instant,
}

impl CachedKeys {
    /// Cached set to answer with, or `None` when a fetch is due.
    fn usable_for(&self, kid: &str, ttl: Duration, min_refresh: Duration) -> Option<Arc<KeySet>> {
        let age = self.fetched_at.elapsed();
        if age >= ttl {
            return None;
        }
        if self.keys.contains(kid) || age < min_refresh {
            return Some(Arc::clone(&self.keys));
        }
        None
    }
}

#[derive(Debug)]
struct FailedFetch {
    at: Instant,
    error: AuthError,
}

pub struct JwksProvider {
    settings: JwksSettings,
    client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
    // Serializes refetches so a burst of misses produces one request.
    refresh: Mutex<Option<FailedFetch>>,
}

impl std::fmt::Debug for JwksProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksProvider")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl JwksProvider {
    pub fn new(settings: JwksSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.fetch_timeout)
            .timeout(settings.fetch_timeout)
            .build()?;

        Ok(Self {
            settings,
            client,
            cache: RwLock::new(None),
            refresh: Mutex::new(None),
        })
    }

    async fn cached_for(&self, kid: &str) -> Option<Arc<KeySet>> {
        self.cache.read().await.as_ref().and_then(|cached| {
            cached.usable_for(
                kid,
                self.settings.cache_ttl,
                self.settings.min_refresh_interval,
            )
        })
    }

    async fn fetch(&self) -> Result<KeySet, AuthError> {
        let url = self.settings.url.clone();
        tracing::debug!(%url, "fetching jwks");

        let request = async {
            self.client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .json::<JwkSet>()
                .await
        };

        let jwks = match tokio::time::timeout(self.settings.fetch_timeout, request).await {
            Ok(Ok(jwks)) => jwks,
            Ok(Err(err)) if err.is_timeout() => {
                return Err(AuthError::key_set_unavailable("jwks fetch timed out"));
            }
            Ok(Err(err)) => {
                return Err(AuthError::key_set_unavailable(format!(
                    "jwks fetch failed: {err}"
                )));
            }
            Err(_) => return Err(AuthError::key_set_unavailable("jwks fetch timed out")),
        };

        let keys = KeySet::from_jwk_set(&jwks);
        if keys.is_empty() {
            tracing::warn!(url = %self.settings.url, "jwks contains no usable signing keys");
        }
        Ok(keys)
    }

    /// Cached set if it still holds `kid`, otherwise `err`.
    async fn stale_or(&self, kid: &str, err: AuthError) -> Result<Arc<KeySet>, AuthError> {
        let stale = self
            .cache
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.keys.contains(kid))
            .map(|cached| Arc::clone(&cached.keys));

        match stale {
            Some(keys) => {
                tracing::warn!(error = %err, kid, "jwks refresh failed, serving cached keys");
                Ok(keys)
            }
            None => {
                tracing::warn!(error = %err, kid, "jwks unavailable");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl KeyProvider for JwksProvider {
    async fn key_set(&self, kid: &str) -> Result<Arc<KeySet>, AuthError> {
        if let Some(keys) = self.cached_for(kid).await {
            return Ok(keys);
        }

        let mut last_failure = self.refresh.lock().await;
        // Another task may have refreshed while we waited.
        if let Some(keys) = self.cached_for(kid).await {
            return Ok(keys);
        }
        if let Some(failure) = last_failure.as_ref()
            && failure.at.elapsed() < self.settings.min_refresh_interval
        {
            return self.stale_or(kid, failure.error.clone()).await;
        }

        match self.fetch().await {
            Ok(keys) => {
                let keys = Arc::new(keys);
                tracing::info!(keys = keys.len(), "jwks refreshed");
                *self.cache.write().await = Some(CachedKeys {
                    keys: Arc::clone(&keys),
                    fetched_at: Instant::now(),
                });
                *last_failure = None;
                Ok(keys)
            }
            Err(err) => {
                *last_failure = Some(FailedFetch {
                    at: Instant::now(),
                    error: err.clone(),
                });
                self.stale_or(kid, err).await
            }
        }
    }
}
