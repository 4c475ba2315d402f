//! Bearer token authorization.
//!
//! `Authorizer::authorize` runs the whole pipeline for one request:
//! header -> structural decode -> algorithm allow-list -> key lookup -> signature ->
//! registered claims -> permission. Each step fails with its own `AuthErrorKind`;
//! nothing is retried.
use std::{fmt, str::FromStr, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::de::IgnoredAny;
use serde_json::{Map, Value};

use super::bearer::extract_bearer;
use super::claims::{ClaimSet, TokenHeader};
use super::error::{AuthError, AuthErrorKind};
use super::key_set::{KeyProvider, KeySet};

pub type AuthorizationResult = Result<ClaimSet, AuthError>;

/// What a token must satisfy besides carrying the route's permission.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub issuer: String,
    pub audience: String,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
}

/// HMAC family. Never accepted for provider-issued tokens.
pub fn is_symmetric(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

struct DecodedToken {
    header: TokenHeader,
    claims: ClaimSet,
}

pub struct Authorizer {
    policy: AuthPolicy,
    keys: Arc<dyn KeyProvider>,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Authorizer {
    pub fn new(policy: AuthPolicy, keys: Arc<dyn KeyProvider>) -> Self {
        Self { policy, keys }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Authorize a request given its raw `Authorization` header value.
    pub async fn authorize(
        &self,
        raw_header: Option<&str>,
        required_permission: &str,
    ) -> AuthorizationResult {
        let token = extract_bearer(raw_header)?;
        let decoded = decode_segments(token)?;

        // Before any key lookup: a disallowed alg never costs a JWKS fetch or crypto work.
        let alg = self.allowed_algorithm(&decoded.header.alg)?;

        let kid = decoded
            .header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::malformed_token("token header has no kid"))?;

        let keys = self.keys.key_set(kid).await?;
        self.verify_with_keys(token, decoded.claims, alg, kid, &keys, required_permission)
    }

    fn verify_with_keys(
        &self,
        token: &str,
        claims: ClaimSet,
        alg: Algorithm,
        kid: &str,
        keys: &KeySet,
        required_permission: &str,
    ) -> AuthorizationResult {
        let key = keys.resolve(kid).ok_or_else(|| {
            AuthError::new(
                AuthErrorKind::UnknownSigningKey,
                format!("no signing key with kid '{kid}'"),
            )
        })?;

        verify_signature(token, &key, alg)?;
        self.validate_claims(&claims, chrono::Utc::now().timestamp())?;
        check_permission(&claims, required_permission)?;

        Ok(claims)
    }

    fn allowed_algorithm(&self, name: &str) -> Result<Algorithm, AuthError> {
        let unsupported = |msg: String| AuthError::new(AuthErrorKind::UnsupportedAlgorithm, msg);

        if name.eq_ignore_ascii_case("none") {
            return Err(unsupported("unsigned tokens are not accepted".into()));
        }
        let alg = Algorithm::from_str(name)
            .map_err(|_| unsupported(format!("unknown signing algorithm '{name}'")))?;
        if is_symmetric(alg) {
            return Err(unsupported(format!(
                "symmetric signing algorithm '{name}' is not accepted"
            )));
        }
        if !self.policy.algorithms.contains(&alg) {
            return Err(unsupported(format!(
                "signing algorithm '{name}' is not allowed"
            )));
        }

        Ok(alg)
    }

    fn validate_claims(&self, claims: &ClaimSet, now: i64) -> Result<(), AuthError> {
        let leeway = i64::try_from(self.policy.leeway_seconds).unwrap_or(i64::MAX);

        let exp = claims.numeric_date("exp").ok_or_else(|| {
            AuthError::new(AuthErrorKind::TokenExpired, "token has no usable exp claim")
        })?;
        if now.saturating_sub(leeway) >= exp {
            return Err(AuthError::new(
                AuthErrorKind::TokenExpired,
                "token expired",
            ));
        }

        if claims.get("nbf").is_some() {
            let nbf = claims
                .numeric_date("nbf")
                .ok_or_else(|| AuthError::invalid_claims("nbf claim must be a number"))?;
            if nbf > now.saturating_add(leeway) {
                return Err(AuthError::invalid_claims("token is not valid yet"));
            }
        }

        if claims.issuer() != Some(self.policy.issuer.as_str()) {
            return Err(AuthError::invalid_claims(
                "incorrect claims, please check the issuer",
            ));
        }
        if !claims.has_audience(&self.policy.audience) {
            return Err(AuthError::invalid_claims(
                "incorrect claims, please check the audience",
            ));
        }

        Ok(())
    }
}

fn decode_segments(token: &str) -> Result<DecodedToken, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        return Err(AuthError::malformed_token(
            "token must have exactly three segments",
        ));
    };

    let header = decode_json_object(header, "header")?;
    let header: TokenHeader = serde_json::from_value(Value::Object(header))
        .map_err(|_| AuthError::malformed_token("token header has no usable alg"))?;
    let claims = decode_json_object(payload, "payload")?;

    Ok(DecodedToken {
        header,
        claims: ClaimSet::new(claims),
    })
}

fn decode_json_object(segment: &str, what: &str) -> Result<Map<String, Value>, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::malformed_token(format!("token {what} is not base64url")))?;
    serde_json::from_slice::<Map<String, Value>>(&bytes)
        .map_err(|_| AuthError::malformed_token(format!("token {what} is not a JSON object")))
}

/// Signature only: registered claims are validated by `validate_claims` so that each
/// violation keeps its own kind.
fn verify_signature(token: &str, key: &DecodingKey, alg: Algorithm) -> Result<(), AuthError> {
    let mut validation = Validation::new(alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match jsonwebtoken::decode::<IgnoredAny>(token, key, &validation) {
        Ok(_) => Ok(()),
        Err(err) => Err(match err.kind() {
            ErrorKind::InvalidSignature => {
                AuthError::new(AuthErrorKind::InvalidSignature, "signature does not match")
            }
            // Key family differs from the header alg (e.g. ES256 header, RSA key).
            ErrorKind::InvalidAlgorithm => {
                tracing::error!(error = %err, ?alg, "signing key does not fit token algorithm");
                AuthError::internal("signing key does not match token algorithm")
            }
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                AuthError::malformed_token("token could not be decoded")
            }
            _ => {
                tracing::error!(error = %err, "unexpected token verification failure");
                AuthError::internal("token could not be verified")
            }
        }),
    }
}

fn check_permission(claims: &ClaimSet, required: &str) -> Result<(), AuthError> {
    match claims.permissions() {
        None => Err(AuthError::new(
            AuthErrorKind::PermissionsClaimMissing,
            "permissions not included in token",
        )),
        Some(Err(())) => Err(AuthError::invalid_claims(
            "permissions claim must be an array of strings",
        )),
        Some(Ok(granted)) if granted.contains(&required) => Ok(()),
        Some(Ok(_)) => Err(AuthError::new(
            AuthErrorKind::InsufficientPermission,
            format!("permission '{required}' not granted"),
        )),
    }
}
