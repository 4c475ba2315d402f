/*
 * Responsibility
 * - Drinks request/response DTOs
 * - short(): recipe without ingredient names (public listing)
 * - long(): full recipe (requires get:drinks-detail)
 */
use serde::{Deserialize, Serialize};

use crate::repos::drink_repo::{DrinkRow, RecipePart};

const TITLE_MAX_CHARS: usize = 80;

/// Clients send either a single part or a list of parts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<RecipePart>),
    One(RecipePart),
}

impl RecipeInput {
    pub fn into_parts(self) -> Vec<RecipePart> {
        match self {
            RecipeInput::Many(parts) => parts,
            RecipeInput::One(part) => vec![part],
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        let parts: &[RecipePart] = match self {
            RecipeInput::Many(parts) => parts,
            RecipeInput::One(part) => std::slice::from_ref(part),
        };
        if parts.is_empty() {
            return Err("recipe must contain at least one part");
        }
        for part in parts {
            if part.name.trim().is_empty() {
                return Err("recipe part name is required");
            }
            if part.color.trim().is_empty() {
                return Err("recipe part color is required");
            }
            if part.parts == 0 {
                return Err("recipe part must be at least 1 part");
            }
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err("title cannot be empty");
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err("title must be <= 80 chars");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

impl CreateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let Some(title) = &self.title else {
            return Err("title is required");
        };
        validate_title(title)?;
        match &self.recipe {
            Some(recipe) => recipe.validate(),
            None => Err("recipe is required"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

impl UpdateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(recipe) = &self.recipe {
            recipe.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ShortRecipePart {
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Serialize)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortRecipePart>,
}

impl From<DrinkRow> for DrinkShort {
    fn from(row: DrinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            recipe: row
                .recipe
                .0
                .into_iter()
                .map(|p| ShortRecipePart {
                    color: p.color,
                    parts: p.parts,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinkLong {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

impl From<DrinkRow> for DrinkLong {
    fn from(row: DrinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            recipe: row.recipe.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn ok(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}
