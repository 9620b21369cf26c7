//! In-memory stand-ins for the Postgres stores and the upload directory,
//! wired into `AppState::fake()`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{User, UserId, UserInsertError};
use crate::recipes::query::{SearchFilter, PAGE_SIZE};
use crate::recipes::repo::RecipeStore;
use crate::recipes::repo_types::{Recipe, RecipeDetails, RecipeFields, RecipeId, RecipeSummary};
use crate::storage::StorageClient;

#[derive(Default)]
pub struct FakeStorage {
    fail: bool,
    keys: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, _body: Bytes) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        let mut keys = self.keys.lock().unwrap();
        if keys.iter().any(|k| k == key) {
            anyhow::bail!("key {key} already exists");
        }
        keys.push(key.to_string());
        Ok(())
    }
}

/// Enforces the same uniqueness rules as the `users` table constraints.
#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

impl MemoryUsers {
    fn username_of(&self, id: UserId) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> anyhow::Result<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserInsertError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.username == username || u.email == email) {
            return Err(UserInsertError::Duplicate);
        }
        let user = User {
            id: rows.len() as UserId + 1,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }
}

pub struct MemoryRecipes {
    users: Arc<MemoryUsers>,
    rows: Mutex<Vec<Recipe>>,
}

impl MemoryRecipes {
    pub fn new(users: Arc<MemoryUsers>) -> Self {
        Self {
            users,
            rows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipes {
    async fn insert(
        &self,
        owner_id: UserId,
        fields: &RecipeFields,
        image: Option<&str>,
    ) -> anyhow::Result<RecipeId> {
        if self.users.username_of(owner_id).is_none() {
            anyhow::bail!("foreign key violation: user {owner_id}");
        }
        let mut rows = self.rows.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let id = rows.len() as RecipeId + 1;
        rows.push(Recipe {
            id,
            user_id: owner_id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            cuisine: fields.cuisine,
            cooking_time: fields.cooking_time,
            ingredients: fields.ingredients.clone(),
            instructions: fields.instructions.clone(),
            image: image.map(str::to_string),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn get_details(&self, id: RecipeId) -> anyhow::Result<Option<RecipeDetails>> {
        let recipe = self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned();
        Ok(recipe.and_then(|recipe| {
            self.users
                .username_of(recipe.user_id)
                .map(|owner_username| RecipeDetails {
                    recipe,
                    owner_username,
                })
        }))
    }

    async fn get_owned(&self, id: RecipeId, owner_id: UserId) -> anyhow::Result<Option<Recipe>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.user_id == owner_id)
            .cloned())
    }

    async fn update_owned(
        &self,
        id: RecipeId,
        owner_id: UserId,
        fields: &RecipeFields,
        image: Option<&str>,
    ) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(r) = rows.iter_mut().find(|r| r.id == id && r.user_id == owner_id) else {
            return Ok(false);
        };
        r.name = fields.name.clone();
        r.description = fields.description.clone();
        r.cuisine = fields.cuisine;
        r.cooking_time = fields.cooking_time;
        r.ingredients = fields.ingredients.clone();
        r.instructions = fields.instructions.clone();
        r.image = image.map(str::to_string);
        r.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> anyhow::Result<Vec<RecipeSummary>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.user_id == owner_id)
            .map(RecipeSummary::from)
            .collect())
    }

    async fn search(&self, filter: &SearchFilter) -> anyhow::Result<Vec<RecipeSummary>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .map(RecipeSummary::from)
            .filter(|s| filter.matches(s))
            .take(PAGE_SIZE as usize)
            .collect())
    }
}
