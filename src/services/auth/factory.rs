/// Factory: build the shared `Authorizer` from application `Config`.
use std::sync::Arc;

use jsonwebtoken::jwk::JwkSet;
use thiserror::Error;

use crate::config::{Config, KeySource};
use crate::services::auth::jwks::{JwksProvider, JwksSettings};
use crate::services::auth::key_set::{KeyProvider, KeySet, StaticKeyProvider};
use crate::services::auth::{AuthPolicy, Authorizer};

#[derive(Debug, Error)]
pub enum AuthSetupError {
    #[error("failed to build jwks http client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to read jwks file {path}: {source}")]
    ReadJwks {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid jwks document: {0}")]
    InvalidJwks(#[from] serde_json::Error),
    #[error("jwks file contains no usable signing keys")]
    EmptyJwks,
}

pub fn build_authorizer(config: &Config) -> Result<Arc<Authorizer>, AuthSetupError> {
    let keys: Arc<dyn KeyProvider> = match &config.key_source {
        KeySource::Remote(url) => Arc::new(JwksProvider::new(JwksSettings {
            url: url.clone(),
            fetch_timeout: config.jwks_fetch_timeout,
            cache_ttl: config.jwks_cache_ttl,
            min_refresh_interval: config.jwks_min_refresh_interval,
        })?),
        KeySource::File(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| AuthSetupError::ReadJwks {
                path: path.display().to_string(),
                source,
            })?;
            let jwks: JwkSet = serde_json::from_str(&raw)?;
            let keys = KeySet::from_jwk_set(&jwks);
            if keys.is_empty() {
                return Err(AuthSetupError::EmptyJwks);
            }
            Arc::new(StaticKeyProvider::new(keys))
        }
    };

    let policy = AuthPolicy {
        issuer: config.auth_issuer.clone(),
        audience: config.auth_audience.clone(),
        algorithms: config.auth_algorithms.clone(),
        leeway_seconds: config.access_token_leeway_seconds,
    };

    let authorizer = Authorizer::new(policy, keys);
    tracing::info!(
        issuer = %authorizer.policy().issuer,
        audience = %authorizer.policy().audience,
        algorithms = ?authorizer.policy().algorithms,
        key_source = ?config.key_source,
        "authorizer ready"
    );

    Ok(Arc::new(authorizer))
}
