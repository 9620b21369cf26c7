use tracing::{info, warn};

use super::dto::{RecipeFormInput, SearchParams};
use super::query::SearchFilter;
use super::repo_types::{Cuisine, Recipe, RecipeDetails, RecipeFields, RecipeId, RecipeSummary};
use crate::auth::session::Session;
use crate::error::AppError;
use crate::images::services::{store_upload, Upload};
use crate::state::AppState;

#[derive(Debug)]
pub struct SavedRecipe {
    pub id: RecipeId,
    pub image: Option<String>,
    pub warnings: Vec<String>,
}

fn required_text(value: Option<String>, field: &'static str, label: &str) -> Result<String, AppError> {
    let value = value.unwrap_or_default().trim().to_string();
    if value.is_empty() {
        return Err(AppError::validation(field, format!("{label} is required")));
    }
    Ok(value)
}

/// Trims free text, parses cuisine and cooking time.
pub fn parse_fields(input: RecipeFormInput) -> Result<RecipeFields, AppError> {
    let name = required_text(input.name, "name", "Recipe name")?;
    let description = required_text(input.description, "description", "Description")?;
    let cuisine = input
        .cuisine
        .as_deref()
        .unwrap_or_default()
        .parse::<Cuisine>()
        .map_err(|e| AppError::validation("type", e.to_string()))?;
    let cooking_time = input
        .cooking_time
        .as_deref()
        .unwrap_or_default()
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|t| *t > 0)
        .ok_or_else(|| {
            AppError::validation("cooking_time", "Cooking time must be a positive number of minutes")
        })?;
    let ingredients = required_text(input.ingredients, "ingredients", "Ingredients")?;
    let instructions = required_text(input.instructions, "instructions", "Instructions")?;
    Ok(RecipeFields {
        name,
        description,
        cuisine,
        cooking_time,
        ingredients,
        instructions,
    })
}

pub fn parse_filter(params: &SearchParams) -> Result<SearchFilter, AppError> {
    let cuisine = match params.cuisine.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<Cuisine>()
                .map_err(|e| AppError::validation("type", e.to_string()))?,
        ),
    };
    Ok(SearchFilter::new(params.name.as_deref(), cuisine))
}

/// The owner always comes from the session.
pub async fn create_recipe(
    state: &AppState,
    session: &Session,
    fields: RecipeFields,
    upload: Option<Upload>,
) -> Result<SavedRecipe, AppError> {
    let stored = store_upload(state.storage.as_ref(), upload).await;
    let id = state
        .recipes
        .insert(session.user_id, &fields, stored.path.as_deref())
        .await?;

    info!(recipe_id = id, user_id = session.user_id, "recipe created");
    Ok(SavedRecipe {
        id,
        image: stored.path,
        warnings: stored.warning.into_iter().collect(),
    })
}

/// Full-field replacement by the owner. The image reference changes only
/// when a new upload was stored.
pub async fn update_recipe(
    state: &AppState,
    session: &Session,
    id: RecipeId,
    fields: RecipeFields,
    upload: Option<Upload>,
) -> Result<SavedRecipe, AppError> {
    let existing = state
        .recipes
        .get_owned(id, session.user_id)
        .await?
        .ok_or(AppError::NotFoundOrForbidden)?;

    let stored = store_upload(state.storage.as_ref(), upload).await;
    let image = stored.path.or(existing.image);

    let updated = state
        .recipes
        .update_owned(id, session.user_id, &fields, image.as_deref())
        .await?;
    if !updated {
        warn!(recipe_id = id, user_id = session.user_id, "recipe vanished during update");
        return Err(AppError::NotFoundOrForbidden);
    }

    info!(recipe_id = id, user_id = session.user_id, "recipe updated");
    Ok(SavedRecipe {
        id,
        image,
        warnings: stored.warning.into_iter().collect(),
    })
}

pub async fn get_recipe(state: &AppState, id: RecipeId) -> Result<RecipeDetails, AppError> {
    state
        .recipes
        .get_details(id)
        .await?
        .ok_or(AppError::NotFoundOrForbidden)
}

pub async fn get_for_edit(
    state: &AppState,
    session: &Session,
    id: RecipeId,
) -> Result<Recipe, AppError> {
    state
        .recipes
        .get_owned(id, session.user_id)
        .await?
        .ok_or(AppError::NotFoundOrForbidden)
}

pub async fn list_mine(state: &AppState, session: &Session) -> Result<Vec<RecipeSummary>, AppError> {
    Ok(state.recipes.list_by_owner(session.user_id).await?)
}

pub async fn search(state: &AppState, filter: &SearchFilter) -> Result<Vec<RecipeSummary>, AppError> {
    Ok(state.recipes.search(filter).await?)
}
