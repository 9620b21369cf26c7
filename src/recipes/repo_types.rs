use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::repo_types::UserId;

pub type RecipeId = i64;

/// Culinary origin; stored as the Postgres enum `cuisine_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cuisine_type")]
pub enum Cuisine {
    French,
    Italian,
    Chinese,
    Indian,
    Mexican,
    Others,
}

impl Cuisine {
    pub const ALL: [Cuisine; 6] = [
        Cuisine::French,
        Cuisine::Italian,
        Cuisine::Chinese,
        Cuisine::Indian,
        Cuisine::Mexican,
        Cuisine::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Cuisine::French => "French",
            Cuisine::Italian => "Italian",
            Cuisine::Chinese => "Chinese",
            Cuisine::Indian => "Indian",
            Cuisine::Mexican => "Mexican",
            Cuisine::Others => "Others",
        }
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCuisine(pub String);

impl fmt::Display for UnknownCuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cuisine type {:?}", self.0)
    }
}

impl std::error::Error for UnknownCuisine {}

impl FromStr for Cuisine {
    type Err = UnknownCuisine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Cuisine::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCuisine(s.to_string()))
    }
}

/// Full recipe row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: RecipeId,
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub cuisine: Cuisine,
    pub cooking_time: i32, // minutes, > 0
    pub ingredients: String,
    pub instructions: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Recipe joined with its owner's username, for the detail view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub recipe: Recipe,
    pub owner_username: String,
}

/// Row shape of listing queries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub cuisine: Cuisine,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<&Recipe> for RecipeSummary {
    fn from(r: &Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            description: r.description.clone(),
            cuisine: r.cuisine,
            cooking_time: r.cooking_time,
            image: r.image.clone(),
            created_at: r.created_at,
        }
    }
}

/// Every user-editable column. Create and update both write all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub name: String,
    pub description: String,
    pub cuisine: Cuisine,
    pub cooking_time: i32,
    pub ingredients: String,
    pub instructions: String,
}
