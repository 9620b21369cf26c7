use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{
    RecipeEditView, RecipeFormInput, RecipeListItem, RecipeView, SavedRecipeResponse,
    SearchParams,
};
use super::repo_types::RecipeId;
use super::services::{self, SavedRecipe};
use crate::{auth::session::Session, error::AppError, images::services::Upload, state::AppState};

pub fn routes(max_body: usize) -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/:id", get(get_recipe).put(update_recipe))
        .route("/recipes/:id/edit", get(edit_form))
        .route("/me/recipes", get(my_recipes))
        .layer(DefaultBodyLimit::max(max_body))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RecipeListItem>>, AppError> {
    let filter = services::parse_filter(&params)?;
    let rows = services::search(&state, &filter).await?;
    Ok(Json(rows.into_iter().map(RecipeListItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeView>, AppError> {
    Ok(Json(services::get_recipe(&state, id).await?.into()))
}

#[instrument(skip(state))]
pub async fn my_recipes(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<RecipeListItem>>, AppError> {
    let rows = services::list_mine(&state, &session).await?;
    Ok(Json(rows.into_iter().map(RecipeListItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeEditView>, AppError> {
    Ok(Json(services::get_for_edit(&state, &session, id).await?.into()))
}

/// POST /recipes (multipart): name, description, type, cookingtime,
/// ingredients, instructions, optional image file.
#[instrument(skip(state, mp))]
pub async fn create_recipe(
    State(state): State<AppState>,
    session: Session,
    mp: Multipart,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<SavedRecipeResponse>), AppError> {
    let (input, upload, mut warnings) = read_recipe_form(mp).await;
    let fields = services::parse_fields(input)?;
    let saved = services::create_recipe(&state, &session, fields, upload).await?;
    let location = format!("/api/v1/recipes/{}", saved.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(saved_response(saved, &mut warnings)),
    ))
}

/// PUT /recipes/:id (multipart), same fields as create. Omitting the
/// image keeps the current one.
#[instrument(skip(state, mp))]
pub async fn update_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<RecipeId>,
    mp: Multipart,
) -> Result<Json<SavedRecipeResponse>, AppError> {
    let (input, upload, mut warnings) = read_recipe_form(mp).await;
    let fields = services::parse_fields(input)?;
    let saved = services::update_recipe(&state, &session, id, fields, upload).await?;
    Ok(Json(saved_response(saved, &mut warnings)))
}

fn saved_response(saved: SavedRecipe, form_warnings: &mut Vec<String>) -> SavedRecipeResponse {
    form_warnings.extend(saved.warnings);
    SavedRecipeResponse {
        id: saved.id,
        image: saved.image,
        warnings: std::mem::take(form_warnings),
    }
}

async fn field_text(field: Field<'_>) -> Option<String> {
    let name = field.name().unwrap_or_default().to_string();
    match field.text().await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, field = %name, "form field could not be read");
            None
        }
    }
}

/// Collects the text fields and the optional image. A broken image part is
/// treated as no upload plus a warning; missing text fields surface later
/// as validation errors.
async fn read_recipe_form(mut mp: Multipart) -> (RecipeFormInput, Option<Upload>, Vec<String>) {
    let mut input = RecipeFormInput::default();
    let mut upload = None;
    let mut warnings = Vec::new();

    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "multipart stream ended early");
                break;
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => input.name = field_text(field).await,
            "description" => input.description = field_text(field).await,
            "type" | "cuisine" => input.cuisine = field_text(field).await,
            "cookingtime" | "cooking_time" => input.cooking_time = field_text(field).await,
            "ingredients" => input.ingredients = field_text(field).await,
            "instructions" => input.instructions = field_text(field).await,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    continue;
                }
                match field.bytes().await {
                    Ok(body) => upload = Some(Upload { file_name, body }),
                    Err(e) => {
                        warn!(error = %e, "image part could not be read");
                        warnings.push("Image upload failed.".to_string());
                    }
                }
            }
            _ => {}
        }
    }

    (input, upload, warnings)
}
