/*
 * Responsibility
 * - SQLx access to the `drinks` table
 * - recipe is stored as JSONB (array of parts)
 */
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, types::Json};

use crate::repos::error::RepoError;

/// One ingredient of a drink, in the order it is poured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePart {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, FromRow)]
pub struct DrinkRow {
    pub id: i64,
    pub title: String,
    pub recipe: Json<Vec<RecipePart>>,
}

pub async fn list(db: &PgPool) -> Result<Vec<DrinkRow>, RepoError> {
    let rows = sqlx::query_as::<_, DrinkRow>(
        r#"
        SELECT id, title, recipe
        FROM drinks
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    title: &str,
    recipe: &[RecipePart],
) -> Result<DrinkRow, RepoError> {
    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        INSERT INTO drinks (title, recipe)
        VALUES ($1, $2)
        RETURNING id, title, recipe
        "#,
    )
    .bind(title)
    .bind(Json(recipe))
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

/// `None` fields are left untouched.
pub async fn update(
    db: &PgPool,
    id: i64,
    title: Option<&str>,
    recipe: Option<&[RecipePart]>,
) -> Result<Option<DrinkRow>, RepoError> {
    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        UPDATE drinks
        SET
            title = COALESCE($2, title),
            recipe = COALESCE($3, recipe),
            updated_at = now()
        WHERE id = $1
        RETURNING id, title, recipe
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(recipe.map(Json))
    .fetch_optional(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn delete(db: &PgPool, id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM drinks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
