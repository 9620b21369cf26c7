use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Cuisine, Recipe, RecipeDetails, RecipeId, RecipeSummary};

/// Listing cards show only the start of the description.
pub const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub cuisine: Option<String>,
}

/// Raw text fields of the add/edit form, before validation. Fields the form
/// does not define (an owner id, for instance) are never collected.
#[derive(Debug, Default, Clone)]
pub struct RecipeFormInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub cooking_time: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeListItem {
    pub id: RecipeId,
    pub name: String,
    pub excerpt: String,
    pub cuisine: Cuisine,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<RecipeSummary> for RecipeListItem {
    fn from(s: RecipeSummary) -> Self {
        Self {
            id: s.id,
            excerpt: excerpt(&s.description, EXCERPT_CHARS),
            name: s.name,
            cuisine: s.cuisine,
            cooking_time: s.cooking_time,
            image: s.image,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub cuisine: Cuisine,
    pub cooking_time: i32,
    pub ingredients: String,
    pub instructions: String,
    pub image: Option<String>,
    pub posted_by: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<RecipeDetails> for RecipeView {
    fn from(d: RecipeDetails) -> Self {
        let r = d.recipe;
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            cuisine: r.cuisine,
            cooking_time: r.cooking_time,
            ingredients: r.ingredients,
            instructions: r.instructions,
            image: r.image,
            posted_by: d.owner_username,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Current values for pre-filling the edit form.
#[derive(Debug, Serialize)]
pub struct RecipeEditView {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub cuisine: Cuisine,
    pub cooking_time: i32,
    pub ingredients: String,
    pub instructions: String,
    pub image: Option<String>,
    pub cuisines: [Cuisine; 6],
}

impl From<Recipe> for RecipeEditView {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            cuisine: r.cuisine,
            cooking_time: r.cooking_time,
            ingredients: r.ingredients,
            instructions: r.instructions,
            image: r.image,
            cuisines: Cuisine::ALL,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedRecipeResponse {
    pub id: RecipeId,
    pub image: Option<String>,
    pub warnings: Vec<String>,
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
