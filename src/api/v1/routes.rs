/*
 * Responsibility
 * - URL structure of the drinks API
 * - Which permission guards which method (route_layer per method router)
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::api::v1::handlers::{
    drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
    health::health,
};
use crate::error::AppError;
use crate::middleware::auth::permission;
use crate::state::AppState;

pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const POST_DRINKS: &str = "post:drinks";
pub const PATCH_DRINKS: &str = "patch:drinks";
pub const DELETE_DRINKS: &str = "delete:drinks";

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(list_drinks).merge(permission::require(post(create_drink), state, POST_DRINKS)),
        )
        .route(
            "/drinks-detail",
            permission::require(get(list_drinks_detail), state, GET_DRINKS_DETAIL),
        )
        .route(
            "/drinks/{drink_id}",
            permission::require(patch(update_drink), state, PATCH_DRINKS).merge(
                permission::require(delete(delete_drink), state, DELETE_DRINKS),
            ),
        )
        .fallback(route_not_found)
}

async fn route_not_found() -> AppError {
    AppError::not_found("route")
}
