//! Classified authorization failures.
//!
//! Every expected violation maps onto exactly one `AuthErrorKind`. Each kind owns a
//! stable snake_case code (used in the JSON error body and in logs) and the HTTP
//! status the boundary should answer with.
use std::fmt;

use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    MissingOrMalformedHeader,
    MalformedToken,
    UnsupportedAlgorithm,
    UnknownSigningKey,
    InvalidSignature,
    TokenExpired,
    InvalidClaims,
    PermissionsClaimMissing,
    InsufficientPermission,
    KeySetUnavailable,
    InternalVerificationError,
}

impl AuthErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingOrMalformedHeader => "authorization_header_malformed",
            Self::MalformedToken => "malformed_token",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims => "invalid_claims",
            Self::PermissionsClaimMissing => "permissions_claim_missing",
            Self::InsufficientPermission => "insufficient_permission",
            Self::KeySetUnavailable => "key_set_unavailable",
            Self::InternalVerificationError => "internal_verification_error",
        }
    }

    /// Status the HTTP layer answers with.
    ///
    /// Authenticated-but-forbidden (the two permission kinds) is 403; everything that
    /// says "we could not establish who you are" stays 401. Key provider outages are
    /// ours, not the caller's, so they surface as 503/500.
    pub fn status(self) -> StatusCode {
        match self {
            Self::PermissionsClaimMissing | Self::InsufficientPermission => StatusCode::FORBIDDEN,
            Self::KeySetUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalVerificationError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {description}")]
pub struct AuthError {
    kind: AuthErrorKind,
    description: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn malformed_header(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::MissingOrMalformedHeader, description)
    }

    pub fn malformed_token(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::MalformedToken, description)
    }

    pub fn invalid_claims(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidClaims, description)
    }

    pub fn key_set_unavailable(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::KeySetUnavailable, description)
    }

    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InternalVerificationError, description)
    }
}
