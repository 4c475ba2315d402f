/*
 * Responsibility
 * - Load environment variables / .env (DATABASE_URL, CORS allowlist, auth settings, ...)
 * - Validate values; anything missing or invalid aborts startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::auth::authorizer::is_symmetric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// JWKS endpoint, fetched and cached at runtime.
    Remote(Url),
    /// JWKS document on disk, loaded once at startup.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub database_url: String,
    pub database_max_connections: u32,
    pub database_run_migrations: bool,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_algorithms: Vec<Algorithm>,
    pub access_token_leeway_seconds: u64,

    pub key_source: KeySource,
    pub jwks_fetch_timeout: Duration,
    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh_interval: Duration,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        Some(v) => v.parse::<T>().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Comma-separated allow-list of asymmetric JWS algorithms.
pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS"))?;
        if is_symmetric(alg) {
            return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }
    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
    }
    Ok(algorithms)
}

/// `AUTH0_DOMAIN` may be given as a bare host or with a scheme.
fn domain_base(domain: &str) -> Result<Url, ConfigError> {
    let with_scheme = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    Url::parse(&with_scheme).map_err(|_| ConfigError::Invalid("AUTH0_DOMAIN"))
}

fn resolve_key_source(
    jwks_file: Option<String>,
    jwks_url: Option<String>,
    domain: Option<&Url>,
) -> Result<KeySource, ConfigError> {
    if let Some(path) = jwks_file {
        return Ok(KeySource::File(PathBuf::from(path)));
    }
    if let Some(url) = jwks_url {
        return Url::parse(&url)
            .map(KeySource::Remote)
            .map_err(|_| ConfigError::Invalid("JWKS_URL"));
    }
    let domain = domain.ok_or(ConfigError::Missing("JWKS_URL"))?;
    domain
        .join("/.well-known/jwks.json")
        .map(KeySource::Remote)
        .map_err(|_| ConfigError::Invalid("AUTH0_DOMAIN"))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parsed_or("PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(parsed_or("REQUEST_TIMEOUT_SECONDS", 30)?);
        let request_body_limit_bytes = parsed_or("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database_max_connections = parsed_or("DATABASE_MAX_CONNECTIONS", 5)?;
        let database_run_migrations = match var("DATABASE_RUN_MIGRATIONS") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("DATABASE_RUN_MIGRATIONS"))?,
            None => false,
        };

        let domain = var("AUTH0_DOMAIN").map(|d| domain_base(&d)).transpose()?;

        let auth_issuer = match (var("AUTH_ISSUER"), &domain) {
            (Some(issuer), _) => issuer,
            // Auth0 issues `iss` with a trailing slash.
            (None, Some(base)) => base.to_string(),
            (None, None) => return Err(ConfigError::Missing("AUTH_ISSUER")),
        };

        let auth_audience = var("AUTH_AUDIENCE").ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let auth_algorithms = parse_algorithms(&var("AUTH_ALGORITHMS").unwrap_or_else(|| "RS256".into()))?;

        let access_token_leeway_seconds = parsed_or("ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let key_source = resolve_key_source(var("JWKS_FILE"), var("JWKS_URL"), domain.as_ref())?;

        let jwks_fetch_timeout = Duration::from_millis(parsed_or("JWKS_FETCH_TIMEOUT_MS", 3000)?);
        let jwks_cache_ttl = Duration::from_secs(parsed_or("JWKS_CACHE_TTL_SECONDS", 600)?);
        let jwks_min_refresh_interval =
            Duration::from_secs(parsed_or("JWKS_MIN_REFRESH_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            request_body_limit_bytes,
            database_url,
            database_max_connections,
            database_run_migrations,
            auth_issuer,
            auth_audience,
            auth_algorithms,
            access_token_leeway_seconds,
            key_source,
            jwks_fetch_timeout,
            jwks_cache_ttl,
            jwks_min_refresh_interval,
        })
    }
}
