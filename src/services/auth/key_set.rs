//! Verification keys indexed by `kid`.
//!
//! `KeySet` is an immutable snapshot; providers hand out `Arc<KeySet>` so a
//! verification in flight never observes a half-refreshed set.
use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use jsonwebtoken::{
    DecodingKey,
    jwk::{JwkSet, PublicKeyUse},
};

use super::error::AuthError;

#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
}

impl KeySet {
    /// Build a key set from a JWKS document.
    ///
    /// Keys without a `kid`, encryption keys and keys `jsonwebtoken` cannot turn into a
    /// verification key are skipped; a single bad entry must not take the whole set down.
    pub fn from_jwk_set(jwks: &JwkSet) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.as_deref() else {
                tracing::warn!("skipping jwk without kid");
                continue;
            };
            if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
                tracing::debug!(kid, "skipping encryption jwk");
                continue;
            }
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid.to_string(), Arc::new(key));
                }
                Err(err) => tracing::warn!(kid, error = %err, "skipping unusable jwk"),
            }
        }

        Self { keys }
    }

    pub fn resolve(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("KeySet")
            .field("kids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Source of verification keys.
///
/// `kid` is passed so a provider can decide to refresh when it has never seen the key.
/// Failing to obtain any key set is reported as `KeySetUnavailable`.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn key_set(&self, kid: &str) -> Result<Arc<KeySet>, AuthError>;
}

/// Fixed key set (local JWKS file, tests).
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    keys: Arc<KeySet>,
}

impl StaticKeyProvider {
    pub fn new(keys: KeySet) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn key_set(&self, _kid: &str) -> Result<Arc<KeySet>, AuthError> {
        Ok(Arc::clone(&self.keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::test_keys;

    #[test]
    fn builds_from_jwks_and_resolves_by_kid() {
        let keys = KeySet::from_jwk_set(&test_keys::jwk_set());

        assert_eq!(keys.len(), 1);
        assert!(keys.resolve(test_keys::PRIMARY_KID).is_some());
        assert!(keys.resolve("unknown").is_none());
    }

    #[test]
    fn skips_keys_without_kid_or_for_encryption() {
        let jwks: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kty": "RSA", "n": test_keys::PRIMARY_N, "e": "AQAB" },
                { "kty": "RSA", "kid": "enc-1", "use": "enc", "n": test_keys::PRIMARY_N, "e": "AQAB" },
            ]
        }))
        .unwrap();

        let keys = KeySet::from_jwk_set(&jwks);
        assert!(keys.is_empty());
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let keys = KeySet::from_jwk_set(&test_keys::jwk_set());
        let printed = format!("{keys:?}");
        assert!(printed.contains(test_keys::PRIMARY_KID));
        assert!(!printed.contains(test_keys::PRIMARY_N));
    }

    #[tokio::test]
    async fn static_provider_returns_the_same_snapshot() {
        let provider = StaticKeyProvider::new(KeySet::from_jwk_set(&test_keys::jwk_set()));
        let a = provider.key_set("anything").await.unwrap();
        let b = provider.key_set(test_keys::PRIMARY_KID).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
