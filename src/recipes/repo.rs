use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::query::{search_query, SearchFilter, SUMMARY_COLUMNS};
use super::repo_types::{Recipe, RecipeDetails, RecipeFields, RecipeId, RecipeSummary};
use crate::auth::repo_types::UserId;

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert(
        &self,
        owner_id: UserId,
        fields: &RecipeFields,
        image: Option<&str>,
    ) -> anyhow::Result<RecipeId>;

    /// Unrestricted read joined with the owner's username.
    async fn get_details(&self, id: RecipeId) -> anyhow::Result<Option<RecipeDetails>>;

    /// `None` both when the recipe is missing and when someone else owns it.
    async fn get_owned(&self, id: RecipeId, owner_id: UserId) -> anyhow::Result<Option<Recipe>>;

    /// Full-field replacement scoped by id and owner. Returns whether a row
    /// was updated.
    async fn update_owned(
        &self,
        id: RecipeId,
        owner_id: UserId,
        fields: &RecipeFields,
        image: Option<&str>,
    ) -> anyhow::Result<bool>;

    async fn list_by_owner(&self, owner_id: UserId) -> anyhow::Result<Vec<RecipeSummary>>;

    async fn search(&self, filter: &SearchFilter) -> anyhow::Result<Vec<RecipeSummary>>;
}

#[derive(Clone)]
pub struct PgRecipes {
    db: PgPool,
}

impl PgRecipes {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeStore for PgRecipes {
    async fn insert(
        &self,
        owner_id: UserId,
        fields: &RecipeFields,
        image: Option<&str>,
    ) -> anyhow::Result<RecipeId> {
        let id: RecipeId = sqlx::query_scalar(
            r#"
            INSERT INTO recipes
                (user_id, name, description, cuisine, cooking_time, ingredients, instructions, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.cuisine)
        .bind(fields.cooking_time)
        .bind(&fields.ingredients)
        .bind(&fields.instructions)
        .bind(image)
        .fetch_one(&self.db)
        .await
        .context("insert recipe")?;
        Ok(id)
    }

    async fn get_details(&self, id: RecipeId) -> anyhow::Result<Option<RecipeDetails>> {
        let row = sqlx::query_as::<_, RecipeDetails>(
            r#"
            SELECT r.id, r.user_id, r.name, r.description, r.cuisine, r.cooking_time,
                   r.ingredients, r.instructions, r.image, r.created_at, r.updated_at,
                   u.username AS owner_username
              FROM recipes r
              JOIN users u ON u.id = r.user_id
             WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get recipe details")?;
        Ok(row)
    }

    async fn get_owned(&self, id: RecipeId, owner_id: UserId) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, name, description, cuisine, cooking_time,
                   ingredients, instructions, image, created_at, updated_at
              FROM recipes
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("get owned recipe")?;
        Ok(row)
    }

    async fn update_owned(
        &self,
        id: RecipeId,
        owner_id: UserId,
        fields: &RecipeFields,
        image: Option<&str>,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE recipes
               SET name = $1, description = $2, cuisine = $3, cooking_time = $4,
                   ingredients = $5, instructions = $6, image = $7, updated_at = now()
             WHERE id = $8 AND user_id = $9
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.cuisine)
        .bind(fields.cooking_time)
        .bind(&fields.ingredients)
        .bind(&fields.instructions)
        .bind(image)
        .bind(id)
        .bind(owner_id)
        .execute(&self.db)
        .await
        .context("update recipe")?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> anyhow::Result<Vec<RecipeSummary>> {
        let rows = sqlx::query_as::<_, RecipeSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM recipes r WHERE r.user_id = $1 ORDER BY r.id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list recipes by owner")?;
        Ok(rows)
    }

    async fn search(&self, filter: &SearchFilter) -> anyhow::Result<Vec<RecipeSummary>> {
        let rows = search_query(filter)
            .build_query_as::<RecipeSummary>()
            .fetch_all(&self.db)
            .await
            .context("search recipes")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::recipes::repo_types::Cuisine;

    async fn user(db: &PgPool, name: &str) -> UserId {
        sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, 'x') RETURNING id",
        )
        .bind(name)
        .bind(format!("{name}@example.com"))
        .fetch_one(db)
        .await
        .unwrap()
    }

    fn fields(name: &str, cuisine: Cuisine) -> RecipeFields {
        RecipeFields {
            name: name.into(),
            description: "desc".into(),
            cuisine,
            cooking_time: 30,
            ingredients: "flour".into(),
            instructions: "bake".into(),
        }
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable Postgres"]
    async fn update_is_scoped_by_owner(db: PgPool) {
        let recipes = PgRecipes::new(db.clone());
        let ann = user(&db, "ann").await;
        let bob = user(&db, "bob").await;
        let id = recipes
            .insert(ann, &fields("Tiramisu", Cuisine::Italian), Some("uploads/1_t.png"))
            .await
            .unwrap();

        assert!(recipes.get_owned(id, bob).await.unwrap().is_none());
        assert!(!recipes
            .update_owned(id, bob, &fields("Hijacked", Cuisine::Others), None)
            .await
            .unwrap());
        assert!(recipes
            .update_owned(id, ann, &fields("Tiramisu II", Cuisine::Italian), Some("uploads/1_t.png"))
            .await
            .unwrap());

        let details = recipes.get_details(id).await.unwrap().unwrap();
        assert_eq!(details.recipe.name, "Tiramisu II");
        assert_eq!(details.owner_username, "ann");
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable Postgres"]
    async fn search_filters_orders_and_caps(db: PgPool) {
        let recipes = PgRecipes::new(db.clone());
        let ann = user(&db, "ann").await;
        for i in 0..25 {
            recipes
                .insert(ann, &fields(&format!("Pasta {i}"), Cuisine::Italian), None)
                .await
                .unwrap();
        }
        recipes
            .insert(ann, &fields("Chocolate Cake", Cuisine::French), None)
            .await
            .unwrap();
        recipes
            .insert(ann, &fields("100% Vanilla Cake", Cuisine::French), None)
            .await
            .unwrap();

        let italian = recipes
            .search(&SearchFilter::new(None, Some(Cuisine::Italian)))
            .await
            .unwrap();
        assert_eq!(italian.len(), 20);
        assert!(italian.iter().all(|r| r.cuisine == Cuisine::Italian));
        assert!(italian.windows(2).all(|w| w[0].id > w[1].id));

        let choc = recipes.search(&SearchFilter::new(Some("CHOC"), None)).await.unwrap();
        assert_eq!(choc.len(), 1);
        assert_eq!(choc[0].name, "Chocolate Cake");

        let percent = recipes.search(&SearchFilter::new(Some("%"), None)).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].name, "100% Vanilla Cake");

        assert!(recipes.list_by_owner(user(&db, "carol").await).await.unwrap().is_empty());
    }
}
