/*
 * Responsibility
 * - /drinks CRUD handlers
 * - Authorization already happened in the route's permission middleware;
 *   protected handlers receive the verified claims via AuthClaims
 * - Body/path problems become 422/400 JSON errors instead of axum's plain-text rejections
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinkLong, DrinkShort, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::AuthClaims,
    },
    error::AppError,
    repos::drink_repo,
    state::AppState,
};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::unprocessable(rejection.body_text()))
}

fn drink_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::bad_request("invalid_drink_id", "drink id must be an integer"))
}

fn subject(claims: &AuthClaims) -> &str {
    claims.0.subject().unwrap_or("-")
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<DrinkShort>>, AppError> {
    let rows = drink_repo::list(&state.db).await?;
    let drinks = rows.into_iter().map(DrinkShort::from).collect();

    Ok(Json(DrinksResponse::ok(drinks)))
}

pub async fn list_drinks_detail(
    State(state): State<AppState>,
    _claims: AuthClaims,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let rows = drink_repo::list(&state.db).await?;
    let drinks = rows.into_iter().map(DrinkLong::from).collect();

    Ok(Json(DrinksResponse::ok(drinks)))
}

pub async fn create_drink(
    State(state): State<AppState>,
    claims: AuthClaims,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DrinksResponse<DrinkLong>>), AppError> {
    let req = json_body(payload)?;
    req.validate().map_err(AppError::unprocessable)?;

    let (Some(title), Some(recipe)) = (req.title, req.recipe) else {
        return Err(AppError::unprocessable("title and recipe are required"));
    };
    let recipe = recipe.into_parts();

    let row = drink_repo::create(&state.db, title.trim(), &recipe).await?;
    tracing::info!(drink_id = row.id, subject = subject(&claims), "drink created");

    Ok((
        StatusCode::CREATED,
        Json(DrinksResponse::ok(vec![DrinkLong::from(row)])),
    ))
}

pub async fn update_drink(
    State(state): State<AppState>,
    claims: AuthClaims,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let id = drink_id(path)?;
    let req = json_body(payload)?;
    req.validate().map_err(AppError::unprocessable)?;

    let recipe = req.recipe.map(|r| r.into_parts());

    let row = drink_repo::update(
        &state.db,
        id,
        req.title.as_deref().map(str::trim),
        recipe.as_deref(),
    )
    .await?
    .ok_or(AppError::not_found("drink"))?;
    tracing::info!(drink_id = row.id, subject = subject(&claims), "drink updated");

    Ok(Json(DrinksResponse::ok(vec![DrinkLong::from(row)])))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    claims: AuthClaims,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    let id = drink_id(path)?;

    if !drink_repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("drink"));
    }
    tracing::info!(drink_id = id, subject = subject(&claims), "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
