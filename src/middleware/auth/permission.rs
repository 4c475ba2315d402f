//! Per-route permission guard.
//!
//! Each protected method route is wrapped with the permission it needs:
//!
//! ```ignore
//! .route("/drinks-detail", permission::require(get(list_drinks_detail), &state, "get:drinks-detail"))
//! ```
//!
//! The middleware runs the `Authorizer` before the handler (and before any body is
//! read). On success the verified claims are put into request extensions, where the
//! `AuthClaims` extractor hands them to the handler.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::v1::extractors::AuthClaims;
use crate::error::AppError;
use crate::services::auth::AuthError;
use crate::state::AppState;

#[derive(Clone)]
struct PermissionGuard {
    state: AppState,
    permission: &'static str,
}

pub fn require(
    route: MethodRouter<AppState>,
    state: &AppState,
    permission: &'static str,
) -> MethodRouter<AppState> {
    let guard = PermissionGuard {
        state: state.clone(),
        permission,
    };
    // route_layer: only the methods registered on `route` are guarded
    route.route_layer(middleware::from_fn_with_state(guard, permission_middleware))
}

async fn permission_middleware(
    State(guard): State<PermissionGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let raw = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            AuthError::malformed_header("authorization header is not visible ASCII")
        })?),
    };

    let claims = match guard.state.auth.authorize(raw, guard.permission).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                kind = %err.kind(),
                permission = guard.permission,
                reason = err.description(),
                "authorization denied"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        subject = claims.subject().unwrap_or("-"),
        permission = guard.permission,
        "authorized"
    );

    req.extensions_mut().insert(AuthClaims(claims));

    Ok(next.run(req).await)
}
