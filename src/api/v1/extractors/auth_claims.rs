use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::ClaimSet;
use crate::state::AppState;

/// Verified claims of the caller, for handlers behind `middleware::auth::permission`.
///
/// The middleware inserts this into request extensions after a successful
/// authorization. Missing means the route was registered without a guard, which is a
/// wiring bug, not a client error.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub ClaimSet);

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthClaims>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "AuthClaims requested on an unguarded route");
            AppError::Internal
        })
    }
}
